//! Declarative authorization policy
//!
//! Every protected operation is an [`Action`]; the table below maps each
//! action to the roles permitted to invoke it, evaluated by a single gate
//! instead of per-route role lists.

use crate::error::AppError;
use crate::models::user::{Role, APPROVER_ROLES};

/// Protected operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateEquipment,
    UpdateEquipment,
    DeleteEquipment,
    ListPendingReservations,
    ApproveReservation,
    RejectReservation,
    CheckoutReservation,
    CheckinReservation,
    ViewReports,
    RecordTraining,
}

const CATALOG_MANAGERS: &[Role] = &[Role::TechSecretary, Role::Faculty];

const APPROVERS: &[Role] = &APPROVER_ROLES;

/// Roles permitted to perform an action
pub fn permitted_roles(action: Action) -> &'static [Role] {
    match action {
        Action::CreateEquipment
        | Action::UpdateEquipment
        | Action::DeleteEquipment
        | Action::ViewReports
        | Action::RecordTraining => CATALOG_MANAGERS,
        Action::ListPendingReservations
        | Action::ApproveReservation
        | Action::RejectReservation
        | Action::CheckoutReservation
        | Action::CheckinReservation => APPROVERS,
    }
}

/// Single authorization gate: is `role` allowed to perform `action`?
pub fn authorize(role: Role, action: Action) -> Result<(), AppError> {
    if permitted_roles(action).contains(&role) {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "Role '{}' is not permitted to perform this operation",
            role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approver_roles_may_drive_the_workflow() {
        for role in APPROVERS {
            assert!(authorize(*role, Action::ApproveReservation).is_ok());
            assert!(authorize(*role, Action::CheckinReservation).is_ok());
        }
    }

    #[test]
    fn students_may_not_approve_or_manage_catalog() {
        assert!(authorize(Role::Student, Action::ApproveReservation).is_err());
        assert!(authorize(Role::Student, Action::CreateEquipment).is_err());
        assert!(authorize(Role::Student, Action::ViewReports).is_err());
    }

    #[test]
    fn catalog_mutation_is_narrower_than_approval() {
        assert!(authorize(Role::ClubLead, Action::ApproveReservation).is_ok());
        assert!(authorize(Role::ClubLead, Action::CreateEquipment).is_err());
        assert!(authorize(Role::PhdScholar, Action::ViewReports).is_err());
        assert!(authorize(Role::Faculty, Action::DeleteEquipment).is_ok());
    }
}
