use crate::domain::UserId;

// ============== Privilege ==============

/// Whether `user_id` is on the fixed administrator allow-list.
pub fn is_privileged(user_id: Option<UserId>, admins: &[i64]) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    admins.contains(&user_id.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_listed_users_are_privileged() {
        assert!(is_privileged(Some(UserId(1)), &[1, 2]));
        assert!(!is_privileged(Some(UserId(3)), &[1, 2]));
        assert!(!is_privileged(None, &[1, 2]));
        assert!(!is_privileged(Some(UserId(1)), &[]));
    }
}
