/// Platform role ids, assigned by the user service and forwarded by the
/// gateway.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            5 => Some(Role::ApiUser),
            _ => None,
        }
    }

    /// Attendance is tracked for people on the clock; back-office and
    /// machine roles have no timesheet.
    pub fn tracks_attendance(&self) -> bool {
        matches!(self, Role::Employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_employees_track_attendance() {
        assert!(Role::Employee.tracks_attendance());
        for role in [Role::Admin, Role::Hr, Role::System, Role::ApiUser] {
            assert!(!role.tracks_attendance());
        }
    }

    #[test]
    fn unknown_role_ids_do_not_resolve() {
        assert_eq!(Role::from_id(3), Some(Role::Employee));
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(99), None);
    }
}
