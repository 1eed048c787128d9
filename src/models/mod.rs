use serde::Deserialize;

pub mod attendance;
pub mod employee;
pub mod payroll;
pub mod settings;
pub mod task;
pub mod team;
pub mod user;

/// Distinguishes "field absent" from "field set to null" in update payloads
/// (`Option<Option<T>>` with `#[serde(default)]`). Absent keeps the stored
/// value, explicit null clears it.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}
