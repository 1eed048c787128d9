use uuid::Uuid;

/// Resolved ownership of a single record, fed to the engine for targeted
/// checks. The resolver functions below are the only place FK traversal
/// semantics live; services fetch the referenced ids with their record query
/// and never duck-type on the record itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ownership {
    /// Manager the record rolls up to: `team.manager_id`, or the owning
    /// user's `manager_id` for employee-derived records, or the assignee's
    /// manager for tasks.
    pub manager_id: Option<Uuid>,
    /// The user the record directly belongs to (profile owner, attendance
    /// subject, task assignee).
    pub user_id: Option<Uuid>,
    /// Creator, only meaningful for tasks.
    pub created_by: Option<Uuid>,
}

impl Ownership {
    pub fn team(manager_id: Option<Uuid>) -> Self {
        Ownership { manager_id, ..Default::default() }
    }

    pub fn employee(owner_user_id: Uuid, owner_manager_id: Option<Uuid>) -> Self {
        Ownership {
            manager_id: owner_manager_id,
            user_id: Some(owner_user_id),
            created_by: None,
        }
    }

    /// Attendance resolves through `employee -> user -> manager`.
    pub fn attendance(owner_user_id: Uuid, owner_manager_id: Option<Uuid>) -> Self {
        Self::employee(owner_user_id, owner_manager_id)
    }

    /// Payroll shares the attendance ownership path.
    pub fn payroll(owner_user_id: Uuid, owner_manager_id: Option<Uuid>) -> Self {
        Self::employee(owner_user_id, owner_manager_id)
    }

    pub fn task(created_by: Uuid, assigned_to: Option<Uuid>, assignee_manager_id: Option<Uuid>) -> Self {
        Ownership {
            manager_id: assignee_manager_id,
            user_id: assigned_to,
            created_by: Some(created_by),
        }
    }

    /// Manager-owner test: the record's manager reference matches, or the
    /// manager created it (task `created_by` clause).
    pub fn belongs_to_manager(&self, manager_id: Uuid) -> bool {
        self.manager_id == Some(manager_id) || self.created_by == Some(manager_id)
    }

    /// Employee-owner test. An unassigned task belongs to no user.
    pub fn belongs_to_user(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_task_belongs_to_no_user() {
        let manager = Uuid::new_v4();
        let own = Ownership::task(manager, None, None);
        assert!(!own.belongs_to_user(Uuid::new_v4()));
        assert!(own.belongs_to_manager(manager), "creator clause still applies");
    }

    #[test]
    fn task_assigned_outside_team_still_owned_by_creator() {
        let manager = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let other_manager = Uuid::new_v4();
        let own = Ownership::task(manager, Some(outsider), Some(other_manager));
        assert!(own.belongs_to_manager(manager));
        assert!(!own.belongs_to_manager(Uuid::new_v4()));
        assert!(own.belongs_to_user(outsider));
    }

    #[test]
    fn employee_record_rolls_up_to_manager() {
        let user = Uuid::new_v4();
        let manager = Uuid::new_v4();
        let own = Ownership::attendance(user, Some(manager));
        assert!(own.belongs_to_manager(manager));
        assert!(own.belongs_to_user(user));
        assert!(!own.belongs_to_user(manager));
    }
}
