//! Duel lifecycle: pending -> active -> completed, with decline and cancel
//! as the early exits.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::models::DuelStatus;

pub const MIN_DUEL_DAYS: i32 = 1;
pub const MAX_DUEL_DAYS: i32 = 14;
pub const DUEL_WIN_XP: i64 = 150;
pub const DUEL_DRAW_XP: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelAction {
    Accept,
    Decline,
    Cancel,
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Challenger,
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelOutcome {
    ChallengerWins,
    OpponentWins,
    Draw,
}

pub fn validate_duration(days: i32) -> AppResult<()> {
    if !(MIN_DUEL_DAYS..=MAX_DUEL_DAYS).contains(&days) {
        return Err(AppError::validation(format!(
            "Duel duration must be between {} and {} days",
            MIN_DUEL_DAYS, MAX_DUEL_DAYS
        )));
    }
    Ok(())
}

/// Window that starts when the opponent accepts.
pub fn duel_window(accepted_at: DateTime<Utc>, duration_days: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    (accepted_at, accepted_at + Duration::days(duration_days as i64))
}

/// Next status for `action` taken by `role`, or the reason it is refused.
pub fn transition(
    status: DuelStatus,
    action: DuelAction,
    role: ParticipantRole,
    now: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> AppResult<DuelStatus> {
    if status.is_terminal() {
        return Err(AppError::conflict("Duel has already ended"));
    }

    match (status, action) {
        (DuelStatus::Pending, DuelAction::Accept) | (DuelStatus::Pending, DuelAction::Decline) => {
            if role != ParticipantRole::Opponent {
                return Err(AppError::forbidden("Only the challenged athlete can respond to a duel"));
            }
            Ok(if action == DuelAction::Accept {
                DuelStatus::Active
            } else {
                DuelStatus::Declined
            })
        }
        (DuelStatus::Pending, DuelAction::Cancel) => {
            if role != ParticipantRole::Challenger {
                return Err(AppError::forbidden("Only the challenger can cancel a duel"));
            }
            Ok(DuelStatus::Cancelled)
        }
        (DuelStatus::Active, DuelAction::Resolve) => match ends_at {
            Some(end) if now >= end => Ok(DuelStatus::Completed),
            _ => Err(AppError::conflict("Duel is still running")),
        },
        (DuelStatus::Pending, DuelAction::Resolve) => {
            Err(AppError::conflict("Duel has not been accepted"))
        }
        (DuelStatus::Active, _) => Err(AppError::conflict("Duel is already active")),
        _ => Err(AppError::conflict("Invalid duel transition")),
    }
}

pub fn duel_outcome(challenger_score: f64, opponent_score: f64) -> DuelOutcome {
    if (challenger_score - opponent_score).abs() < f64::EPSILON {
        DuelOutcome::Draw
    } else if challenger_score > opponent_score {
        DuelOutcome::ChallengerWins
    } else {
        DuelOutcome::OpponentWins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_opponent_accepts_and_declines() {
        let now = Utc::now();
        assert_eq!(
            transition(DuelStatus::Pending, DuelAction::Accept, ParticipantRole::Opponent, now, None).unwrap(),
            DuelStatus::Active
        );
        assert_eq!(
            transition(DuelStatus::Pending, DuelAction::Decline, ParticipantRole::Opponent, now, None).unwrap(),
            DuelStatus::Declined
        );
    }

    #[test]
    fn test_challenger_cannot_accept_own_duel() {
        let result = transition(DuelStatus::Pending, DuelAction::Accept, ParticipantRole::Challenger, Utc::now(), None);
        assert_matches!(result, Err(AppError::Forbidden(_)));
    }

    #[test]
    fn test_only_challenger_cancels() {
        let now = Utc::now();
        assert_matches!(
            transition(DuelStatus::Pending, DuelAction::Cancel, ParticipantRole::Opponent, now, None),
            Err(AppError::Forbidden(_))
        );
        assert_eq!(
            transition(DuelStatus::Pending, DuelAction::Cancel, ParticipantRole::Challenger, now, None).unwrap(),
            DuelStatus::Cancelled
        );
    }

    #[test]
    fn test_resolve_waits_for_end() {
        let now = Utc::now();
        let running = transition(
            DuelStatus::Active,
            DuelAction::Resolve,
            ParticipantRole::Challenger,
            now,
            Some(now + Duration::hours(1)),
        );
        assert_matches!(running, Err(AppError::Conflict(_)));

        let done = transition(
            DuelStatus::Active,
            DuelAction::Resolve,
            ParticipantRole::Opponent,
            now,
            Some(now - Duration::hours(1)),
        );
        assert_eq!(done.unwrap(), DuelStatus::Completed);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for status in [DuelStatus::Declined, DuelStatus::Cancelled, DuelStatus::Completed] {
            for action in [DuelAction::Accept, DuelAction::Decline, DuelAction::Cancel, DuelAction::Resolve] {
                assert_matches!(
                    transition(status, action, ParticipantRole::Opponent, Utc::now(), None),
                    Err(AppError::Conflict(_))
                );
            }
        }
    }

    #[test]
    fn test_duel_outcome() {
        assert_eq!(duel_outcome(10.0, 5.0), DuelOutcome::ChallengerWins);
        assert_eq!(duel_outcome(5.0, 10.0), DuelOutcome::OpponentWins);
        assert_eq!(duel_outcome(7.0, 7.0), DuelOutcome::Draw);
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(1).is_ok());
        assert!(validate_duration(14).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(15).is_err());
    }
}
