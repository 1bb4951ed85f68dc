use std::fmt;

/// Recruitment tier derived from a member's cumulative invite count.
///
/// Total order over six thresholds (1, 5, 10, 25, 50, 100) plus the
/// zero tier; upper boundaries are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InviteRank {
    Newcomer,
    Novice,
    Regular,
    Veteran,
    Elite,
    Master,
    Legend,
}

impl InviteRank {
    pub fn for_total(total_invites: i64) -> Self {
        if total_invites >= 100 {
            Self::Legend
        } else if total_invites >= 50 {
            Self::Master
        } else if total_invites >= 25 {
            Self::Elite
        } else if total_invites >= 10 {
            Self::Veteran
        } else if total_invites >= 5 {
            Self::Regular
        } else if total_invites >= 1 {
            Self::Novice
        } else {
            Self::Newcomer
        }
    }

    /// Label the command layer wraps in whatever theme the bot carries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Newcomer => "Newcomer",
            Self::Novice => "Novice Recruiter",
            Self::Regular => "Regular Recruiter",
            Self::Veteran => "Veteran Recruiter",
            Self::Elite => "Elite Recruiter",
            Self::Master => "Master Recruiter",
            Self::Legend => "Legendary Recruiter",
        }
    }
}

impl fmt::Display for InviteRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_the_zero_label() {
        assert_eq!(InviteRank::for_total(0), InviteRank::Newcomer);
        assert_eq!(InviteRank::for_total(-3), InviteRank::Newcomer);
    }

    #[test]
    fn tier_boundaries() {
        for n in 1..=4 {
            assert_eq!(InviteRank::for_total(n), InviteRank::Novice, "n={n}");
        }
        for n in 5..=9 {
            assert_eq!(InviteRank::for_total(n), InviteRank::Regular, "n={n}");
        }
        assert_eq!(InviteRank::for_total(10), InviteRank::Veteran);
        assert_eq!(InviteRank::for_total(24), InviteRank::Veteran);
        assert_eq!(InviteRank::for_total(25), InviteRank::Elite);
        assert_eq!(InviteRank::for_total(49), InviteRank::Elite);
        assert_eq!(InviteRank::for_total(50), InviteRank::Master);
        assert_eq!(InviteRank::for_total(99), InviteRank::Master);
        assert_eq!(InviteRank::for_total(100), InviteRank::Legend);
        assert_eq!(InviteRank::for_total(10_000), InviteRank::Legend);
    }

    #[test]
    fn ranks_are_totally_ordered() {
        assert!(InviteRank::Newcomer < InviteRank::Novice);
        assert!(InviteRank::Master < InviteRank::Legend);
    }
}
