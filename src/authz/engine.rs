use uuid::Uuid;

use super::{Actor, DenyReason, Ownership, Role};
use crate::errors::AppError;

/// Resource types the engine knows about. Adding one means adding rows to
/// [`rule`], not a new conditional tree in a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Team,
    Employee,
    Attendance,
    Payroll,
    Task,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::User,
        Resource::Team,
        Resource::Employee,
        Resource::Attendance,
        Resource::Payroll,
        Resource::Task,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Team => "team",
            Resource::Employee => "employee",
            Resource::Attendance => "attendance",
            Resource::Payroll => "payroll",
            Resource::Task => "task",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Read,
    UpdateFull,
    UpdateStatusOnly,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::List,
        Operation::Create,
        Operation::Read,
        Operation::UpdateFull,
        Operation::UpdateStatusOnly,
        Operation::Delete,
    ];
}

/// Visibility predicate for list/detail queries. Services translate this
/// into the WHERE clause matching their join path; the engine never touches
/// storage itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Unrestricted (admin).
    All,
    /// Records rolling up to this manager: manager-owned, or (for tasks)
    /// created by them or assigned to a direct report.
    Team(Uuid),
    /// Records directly belonging to this user.
    Own(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    AllowWhere(Scope),
    Deny(DenyReason),
}

/// Rule table entry: how a `(role, resource, operation)` cell is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Unconditional allow, no visibility restriction.
    Allow,
    /// Allow, restricted to the actor's team; targeted checks use the
    /// manager-owner resolution (including the task creator clause).
    TeamScoped,
    /// Allow, restricted to records the actor directly owns.
    OwnScoped,
    /// Status-only task update by the assignee.
    OwnStatusOnly,
    /// A plain user sent a full update: FieldsNotAllowed on their own task,
    /// otherwise an ownership denial.
    FieldsGate,
    Deny(DenyReason),
}

/// The rule table. First match wins and admin always wins; every cell for
/// every role/resource/operation is listed here so the whole policy is
/// readable in one place.
fn rule(role: Role, resource: Resource, operation: Operation) -> Rule {
    use DenyReason::*;
    use Operation::*;

    match role {
        Role::Admin => Rule::Allow,

        Role::Manager => match resource {
            // Managers see their direct reports on the list endpoint, but
            // user CRUD is an admin endpoint. Creation denies AdminOnly:
            // the endpoint's role gate admits managers, the write does not.
            Resource::User => match operation {
                List => Rule::TeamScoped,
                Create => Rule::Deny(AdminOnly),
                _ => Rule::Deny(InsufficientRole),
            },
            Resource::Team => match operation {
                Create => Rule::Allow,
                _ => Rule::TeamScoped,
            },
            // Same AdminOnly inconsistency as user creation, preserved.
            Resource::Employee => match operation {
                Create | Delete => Rule::Deny(AdminOnly),
                _ => Rule::TeamScoped,
            },
            // Create is deliberately unscoped: a manager may record
            // attendance/payroll for ANY employee even though list/detail
            // are team-restricted. Flagged for product review, kept as-is.
            Resource::Attendance | Resource::Payroll => match operation {
                Create => Rule::Allow,
                _ => Rule::TeamScoped,
            },
            Resource::Task => match operation {
                Create => Rule::Allow,
                _ => Rule::TeamScoped,
            },
        },

        Role::User => match resource {
            Resource::User | Resource::Team | Resource::Employee | Resource::Payroll => {
                Rule::Deny(InsufficientRole)
            }
            Resource::Attendance => match operation {
                List | Read => Rule::OwnScoped,
                // The caller pins the record to the actor's own profile.
                Create => Rule::Allow,
                _ => Rule::Deny(InsufficientRole),
            },
            Resource::Task => match operation {
                List | Read => Rule::OwnScoped,
                UpdateStatusOnly => Rule::OwnStatusOnly,
                UpdateFull => Rule::FieldsGate,
                Create | Delete => Rule::Deny(InsufficientRole),
            },
        },
    }
}

/// Decide whether `actor` may perform `operation` on `resource`.
///
/// For `List` (no target) the result carries the filter predicate the
/// service applies to its query. For targeted operations the caller passes
/// the record's resolved [`Ownership`]. Pure function of its arguments:
/// identical inputs always produce the identical decision.
pub fn authorize(
    actor: &Actor,
    resource: Resource,
    operation: Operation,
    target: Option<&Ownership>,
) -> Decision {
    let decision = match rule(actor.role, resource, operation) {
        Rule::Allow => match operation {
            Operation::List => Decision::AllowWhere(Scope::All),
            _ => Decision::Allow,
        },
        Rule::TeamScoped => match target {
            None => Decision::AllowWhere(Scope::Team(actor.id)),
            Some(own) if own.belongs_to_manager(actor.id) => Decision::Allow,
            Some(_) => Decision::Deny(DenyReason::NotYourTeam),
        },
        Rule::OwnScoped => match target {
            None => Decision::AllowWhere(Scope::Own(actor.id)),
            Some(own) if own.belongs_to_user(actor.id) => Decision::Allow,
            Some(_) => Decision::Deny(DenyReason::NotYourTeam),
        },
        Rule::OwnStatusOnly => match target {
            Some(own) if own.belongs_to_user(actor.id) => Decision::Allow,
            _ => Decision::Deny(DenyReason::NotYourTeam),
        },
        Rule::FieldsGate => match target {
            Some(own) if own.belongs_to_user(actor.id) => {
                Decision::Deny(DenyReason::FieldsNotAllowed)
            }
            _ => Decision::Deny(DenyReason::NotYourTeam),
        },
        Rule::Deny(reason) => Decision::Deny(reason),
    };

    if let Decision::Deny(reason) = decision {
        tracing::debug!(
            actor_id = %actor.id,
            role = actor.role.as_str(),
            resource = resource.as_str(),
            operation = ?operation,
            reason = ?reason,
            "authorization denied"
        );
    }

    decision
}

/// List/Read visibility predicate for a role/resource pair, or the denial
/// translated into an error.
pub fn list_scope(actor: &Actor, resource: Resource) -> Result<Scope, AppError> {
    match authorize(actor, resource, Operation::List, None) {
        Decision::Allow | Decision::AllowWhere(Scope::All) => Ok(Scope::All),
        Decision::AllowWhere(scope) => Ok(scope),
        Decision::Deny(reason) => Err(reason.into()),
    }
}

/// Gate a mutation; `Ok(())` means proceed.
pub fn require(
    actor: &Actor,
    resource: Resource,
    operation: Operation,
    target: Option<&Ownership>,
) -> Result<(), AppError> {
    match authorize(actor, resource, operation, target) {
        Decision::Allow | Decision::AllowWhere(_) => Ok(()),
        Decision::Deny(reason) => Err(reason.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::Admin, manager_id: None }
    }

    fn manager() -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::Manager, manager_id: None }
    }

    fn user_of(manager: &Actor) -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::User, manager_id: Some(manager.id) }
    }

    #[test]
    fn admin_is_never_denied() {
        let actor = admin();
        let stranger = Ownership::task(Uuid::new_v4(), Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        for resource in Resource::ALL {
            for operation in Operation::ALL {
                for target in [None, Some(&stranger)] {
                    let decision = authorize(&actor, resource, operation, target);
                    assert!(
                        !matches!(decision, Decision::Deny(_)),
                        "admin denied on {resource:?}/{operation:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn list_and_read_share_a_predicate() {
        // A record is listable iff it is readable: the Read decision on a
        // target must agree with membership in the List scope.
        let m = manager();
        let report = user_of(&m);

        for resource in [Resource::Team, Resource::Employee, Resource::Attendance, Resource::Payroll, Resource::Task] {
            let scope = match authorize(&m, resource, Operation::List, None) {
                Decision::AllowWhere(scope) => scope,
                other => panic!("manager list on {resource:?} gave {other:?}"),
            };
            assert_eq!(scope, Scope::Team(m.id));

            let inside = match resource {
                Resource::Team => Ownership::team(Some(m.id)),
                Resource::Task => Ownership::task(Uuid::new_v4(), Some(report.id), Some(m.id)),
                _ => Ownership::employee(report.id, Some(m.id)),
            };
            let outside = match resource {
                Resource::Team => Ownership::team(Some(Uuid::new_v4())),
                Resource::Task => {
                    Ownership::task(Uuid::new_v4(), Some(Uuid::new_v4()), Some(Uuid::new_v4()))
                }
                _ => Ownership::employee(Uuid::new_v4(), Some(Uuid::new_v4())),
            };

            assert_eq!(authorize(&m, resource, Operation::Read, Some(&inside)), Decision::Allow);
            assert_eq!(
                authorize(&m, resource, Operation::Read, Some(&outside)),
                Decision::Deny(DenyReason::NotYourTeam)
            );
        }
    }

    #[test]
    fn plain_user_scopes_to_own_records() {
        let m = manager();
        let u = user_of(&m);

        assert_eq!(list_scope(&u, Resource::Attendance).unwrap(), Scope::Own(u.id));
        assert_eq!(list_scope(&u, Resource::Task).unwrap(), Scope::Own(u.id));
        for resource in [Resource::User, Resource::Team, Resource::Employee, Resource::Payroll] {
            assert!(list_scope(&u, resource).is_err(), "{resource:?} should deny");
        }

        // Teammates' records are out of scope even under the same manager.
        let teammate = user_of(&m);
        let theirs = Ownership::attendance(teammate.id, Some(m.id));
        assert_eq!(
            authorize(&u, Resource::Attendance, Operation::Read, Some(&theirs)),
            Decision::Deny(DenyReason::NotYourTeam)
        );
    }

    #[test]
    fn manager_task_mutation_requires_creator_or_team_assignee() {
        let m = manager();
        let report = user_of(&m);

        let created = Ownership::task(m.id, Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        let team = Ownership::task(Uuid::new_v4(), Some(report.id), Some(m.id));
        let foreign = Ownership::task(Uuid::new_v4(), Some(Uuid::new_v4()), Some(Uuid::new_v4()));

        for own in [&created, &team] {
            assert_eq!(authorize(&m, Resource::Task, Operation::UpdateFull, Some(own)), Decision::Allow);
            assert_eq!(authorize(&m, Resource::Task, Operation::Delete, Some(own)), Decision::Allow);
        }
        assert_eq!(
            authorize(&m, Resource::Task, Operation::UpdateFull, Some(&foreign)),
            Decision::Deny(DenyReason::NotYourTeam)
        );
        assert_eq!(
            authorize(&m, Resource::Task, Operation::Delete, Some(&foreign)),
            Decision::Deny(DenyReason::NotYourTeam)
        );
    }

    #[test]
    fn user_status_only_update_gate() {
        let m = manager();
        let u = user_of(&m);
        let mine = Ownership::task(m.id, Some(u.id), Some(m.id));
        let unassigned = Ownership::task(m.id, None, None);

        assert_eq!(
            authorize(&u, Resource::Task, Operation::UpdateStatusOnly, Some(&mine)),
            Decision::Allow
        );
        // Any extra field routes as a full update and is rejected.
        assert_eq!(
            authorize(&u, Resource::Task, Operation::UpdateFull, Some(&mine)),
            Decision::Deny(DenyReason::FieldsNotAllowed)
        );
        assert_eq!(
            authorize(&u, Resource::Task, Operation::UpdateStatusOnly, Some(&unassigned)),
            Decision::Deny(DenyReason::NotYourTeam)
        );
        assert_eq!(
            authorize(&u, Resource::Task, Operation::Read, Some(&unassigned)),
            Decision::Deny(DenyReason::NotYourTeam)
        );
        assert_eq!(
            authorize(&u, Resource::Task, Operation::Delete, Some(&mine)),
            Decision::Deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn manager_employee_creation_is_admin_only() {
        let m = manager();
        assert_eq!(
            authorize(&m, Resource::Employee, Operation::Create, None),
            Decision::Deny(DenyReason::AdminOnly)
        );
        assert_eq!(
            authorize(&m, Resource::Employee, Operation::Delete, Some(&Ownership::employee(Uuid::new_v4(), Some(m.id)))),
            Decision::Deny(DenyReason::AdminOnly)
        );
        // The asymmetry: attendance/payroll creation carries no team check.
        assert_eq!(authorize(&m, Resource::Attendance, Operation::Create, None), Decision::Allow);
        assert_eq!(authorize(&m, Resource::Payroll, Operation::Create, None), Decision::Allow);
    }

    #[test]
    fn task_created_for_outsider_visible_to_creator_only() {
        let m = manager();
        let outsider = user_of(&manager());
        let own = Ownership::task(m.id, Some(outsider.id), outsider.manager_id);

        assert_eq!(authorize(&m, Resource::Task, Operation::Read, Some(&own)), Decision::Allow);
        // The outsider IS the assignee, so they can read it; their manager
        // relation is irrelevant to the employee-owner clause.
        assert_eq!(authorize(&outsider, Resource::Task, Operation::Read, Some(&own)), Decision::Allow);

        // But a task assigned to nobody is invisible to every plain user.
        let nobody = Ownership::task(m.id, None, None);
        assert_eq!(
            authorize(&outsider, Resource::Task, Operation::Read, Some(&nobody)),
            Decision::Deny(DenyReason::NotYourTeam)
        );
    }

    #[test]
    fn decisions_are_idempotent() {
        let m = manager();
        let own = Ownership::task(Uuid::new_v4(), Some(Uuid::new_v4()), Some(m.id));
        let first = authorize(&m, Resource::Task, Operation::UpdateFull, Some(&own));
        for _ in 0..10 {
            assert_eq!(authorize(&m, Resource::Task, Operation::UpdateFull, Some(&own)), first);
        }
    }
}
