use crate::model::leave_request::{LeaveStatus, LeaveType};
use crate::model::role::{ReviewTier, Role};
use derive_more::Display;
use serde::Serialize;

/// Reviewer-facing actions on a leave request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, strum_macros::Display)]
pub enum LeaveAction {
    Recommend,
    Approve,
    Reject,
}

/// The mutable workflow portion of a leave request: its status plus the
/// tier that most recently recommended it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct WorkflowState {
    pub status: LeaveStatus,
    pub recommended_by: Option<ReviewTier>,
}

impl WorkflowState {
    pub fn pending() -> Self {
        WorkflowState {
            status: LeaveStatus::Pending,
            recommended_by: None,
        }
    }

    pub fn recommended(tier: ReviewTier) -> Self {
        WorkflowState {
            status: LeaveStatus::Recommended,
            recommended_by: Some(tier),
        }
    }

    /// The attribution marker a successor tier checks against:
    /// `None` while Pending, otherwise whoever recommended last.
    fn marker(&self) -> Option<ReviewTier> {
        match self.status {
            LeaveStatus::Pending => None,
            _ => self.recommended_by,
        }
    }
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum WorkflowError {
    #[display(fmt = "request is already {}", _0)]
    Terminal(LeaveStatus),
    #[display(fmt = "{} role cannot review leave requests", "_0.as_str()")]
    NotAReviewer(Role),
    #[display(fmt = "request is not at the {} stage", _0)]
    OutOfTurn(ReviewTier),
    #[display(fmt = "{} is not the approving authority for this leave type", _0)]
    CannotApprove(ReviewTier),
    #[display(fmt = "{} must approve or reject, not recommend", _0)]
    CannotRecommend(ReviewTier),
}

/// Decide the state a request moves to when `actor` takes `action`, or why
/// the action is illegal. Pure: the caller mutates the store only on `Ok`.
pub fn apply(
    leave_type: LeaveType,
    state: WorkflowState,
    actor: Role,
    action: LeaveAction,
) -> Result<WorkflowState, WorkflowError> {
    if state.status.is_terminal() {
        return Err(WorkflowError::Terminal(state.status));
    }

    // Admin overrides the chain; attribution is left as-is.
    if actor == Role::Admin {
        return Ok(match action {
            LeaveAction::Recommend => WorkflowState {
                status: LeaveStatus::Recommended,
                recommended_by: state.recommended_by,
            },
            LeaveAction::Approve => WorkflowState {
                status: LeaveStatus::Approved,
                ..state
            },
            LeaveAction::Reject => WorkflowState {
                status: LeaveStatus::Rejected,
                ..state
            },
        });
    }

    let tier = actor.tier().ok_or(WorkflowError::NotAReviewer(actor))?;

    match leave_type {
        LeaveType::Compensatory => compensatory(state, tier, action),
        _ => standard(state, tier, action),
    }
}

/// Strict three-tier escalation: HOD -> Director -> Principal. A tier may
/// only touch a request whose marker is exactly its predecessor, and only
/// the Principal terminates the chain.
fn compensatory(
    state: WorkflowState,
    tier: ReviewTier,
    action: LeaveAction,
) -> Result<WorkflowState, WorkflowError> {
    if state.marker() != tier.predecessor() {
        return Err(WorkflowError::OutOfTurn(tier));
    }

    match (action, tier) {
        (LeaveAction::Recommend, ReviewTier::Principal) => {
            Err(WorkflowError::CannotRecommend(tier))
        }
        (LeaveAction::Recommend, _) => Ok(WorkflowState::recommended(tier)),
        (LeaveAction::Approve, ReviewTier::Principal) => Ok(WorkflowState {
            status: LeaveStatus::Approved,
            ..state
        }),
        (LeaveAction::Approve, _) => Err(WorkflowError::CannotApprove(tier)),
        (LeaveAction::Reject, _) => Ok(WorkflowState {
            status: LeaveStatus::Rejected,
            ..state
        }),
    }
}

/// Standard workflow: any tier may pick up a Pending request; a
/// Recommended one is actionable only by tiers above the last
/// recommender. HOD never holds terminal authority.
fn standard(
    state: WorkflowState,
    tier: ReviewTier,
    action: LeaveAction,
) -> Result<WorkflowState, WorkflowError> {
    let below = state.marker().is_none_or(|marker| marker < tier);
    if !below {
        return Err(WorkflowError::OutOfTurn(tier));
    }

    match action {
        LeaveAction::Recommend => Ok(WorkflowState::recommended(tier)),
        LeaveAction::Approve if tier >= ReviewTier::Director => Ok(WorkflowState {
            status: LeaveStatus::Approved,
            ..state
        }),
        LeaveAction::Approve => Err(WorkflowError::CannotApprove(tier)),
        LeaveAction::Reject => Ok(WorkflowState {
            status: LeaveStatus::Rejected,
            ..state
        }),
    }
}

/// Queue-visibility predicate: whether `role` has any legal action on a
/// request in `state`. Requests that are Recommended at a non-matching
/// stage are filtered out rather than reported as errors. Side-effect
/// free, so it can be re-run on every query snapshot.
pub fn is_actionable(leave_type: LeaveType, state: WorkflowState, role: Role) -> bool {
    if state.status.is_terminal() {
        return false;
    }
    if role == Role::Admin {
        return true;
    }
    let Some(tier) = role.tier() else {
        return false;
    };
    match leave_type {
        LeaveType::Compensatory => state.marker() == tier.predecessor(),
        _ => state.marker().is_none_or(|marker| marker < tier),
    }
}

/// Initial workflow state of a freshly submitted request, by submitter
/// role: administrators file pre-approved entries, an HOD's own request
/// enters the chain already carrying their recommendation, everyone else
/// starts Pending.
pub fn initial_state(submitter: Role) -> WorkflowState {
    match submitter {
        Role::Admin => WorkflowState {
            status: LeaveStatus::Approved,
            recommended_by: None,
        },
        Role::Hod => WorkflowState::recommended(ReviewTier::Hod),
        _ => WorkflowState::pending(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(state: WorkflowState, actor: Role, action: LeaveAction) -> Result<WorkflowState, WorkflowError> {
        apply(LeaveType::Compensatory, state, actor, action)
    }

    fn casual(state: WorkflowState, actor: Role, action: LeaveAction) -> Result<WorkflowState, WorkflowError> {
        apply(LeaveType::Casual, state, actor, action)
    }

    #[test]
    fn terminal_states_refuse_every_action() {
        for status in [LeaveStatus::Approved, LeaveStatus::Rejected] {
            let state = WorkflowState {
                status,
                recommended_by: Some(ReviewTier::Director),
            };
            for actor in [Role::Hod, Role::Director, Role::Principal, Role::Admin] {
                for action in [LeaveAction::Recommend, LeaveAction::Approve, LeaveAction::Reject] {
                    assert_eq!(
                        comp(state, actor, action),
                        Err(WorkflowError::Terminal(status)),
                        "{actor:?} {action:?} must not leave {status:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn staff_cannot_review() {
        assert_eq!(
            casual(WorkflowState::pending(), Role::Staff, LeaveAction::Approve),
            Err(WorkflowError::NotAReviewer(Role::Staff))
        );
    }

    #[test]
    fn compensatory_chain_happy_path() {
        // HOD submits on their own behalf: already Recommended by HOD.
        let state = initial_state(Role::Hod);
        assert_eq!(state, WorkflowState::recommended(ReviewTier::Hod));

        let state = comp(state, Role::Director, LeaveAction::Recommend).unwrap();
        assert_eq!(state.status, LeaveStatus::Recommended);
        assert_eq!(state.recommended_by, Some(ReviewTier::Director));

        let state = comp(state, Role::Principal, LeaveAction::Approve).unwrap();
        assert_eq!(state.status, LeaveStatus::Approved);
    }

    #[test]
    fn compensatory_chain_rejects_out_of_turn_actions() {
        // Director may not act before the HOD recommendation exists.
        assert_eq!(
            comp(WorkflowState::pending(), Role::Director, LeaveAction::Recommend),
            Err(WorkflowError::OutOfTurn(ReviewTier::Director))
        );
        // Principal may not approve straight off an HOD recommendation.
        assert_eq!(
            comp(
                WorkflowState::recommended(ReviewTier::Hod),
                Role::Principal,
                LeaveAction::Approve
            ),
            Err(WorkflowError::OutOfTurn(ReviewTier::Principal))
        );
        // Director cannot act on their own recommendation twice.
        assert_eq!(
            comp(
                WorkflowState::recommended(ReviewTier::Director),
                Role::Director,
                LeaveAction::Reject
            ),
            Err(WorkflowError::OutOfTurn(ReviewTier::Director))
        );
    }

    #[test]
    fn compensatory_chain_only_principal_terminates() {
        assert_eq!(
            comp(
                WorkflowState::recommended(ReviewTier::Hod),
                Role::Director,
                LeaveAction::Approve
            ),
            Err(WorkflowError::CannotApprove(ReviewTier::Director))
        );
        assert_eq!(
            comp(
                WorkflowState::recommended(ReviewTier::Director),
                Role::Principal,
                LeaveAction::Recommend
            ),
            Err(WorkflowError::CannotRecommend(ReviewTier::Principal))
        );
        // Each tier may reject at its own stage.
        let rejected = comp(
            WorkflowState::recommended(ReviewTier::Hod),
            Role::Director,
            LeaveAction::Reject,
        )
        .unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
    }

    #[test]
    fn standard_workflow_recommend_then_decide() {
        let state = casual(WorkflowState::pending(), Role::Hod, LeaveAction::Recommend).unwrap();
        assert_eq!(state, WorkflowState::recommended(ReviewTier::Hod));

        // Director picks up the HOD recommendation and approves.
        let state = casual(state, Role::Director, LeaveAction::Approve).unwrap();
        assert_eq!(state.status, LeaveStatus::Approved);
    }

    #[test]
    fn standard_workflow_senior_roles_decide_directly() {
        let approved = casual(WorkflowState::pending(), Role::Principal, LeaveAction::Approve).unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);

        let rejected = casual(WorkflowState::pending(), Role::Director, LeaveAction::Reject).unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
    }

    #[test]
    fn standard_workflow_hod_is_not_terminal_authority() {
        assert_eq!(
            casual(WorkflowState::pending(), Role::Hod, LeaveAction::Approve),
            Err(WorkflowError::CannotApprove(ReviewTier::Hod))
        );
    }

    #[test]
    fn standard_workflow_refuses_actions_below_the_marker() {
        // An HOD cannot act on a request already recommended by a Director.
        assert_eq!(
            casual(
                WorkflowState::recommended(ReviewTier::Director),
                Role::Hod,
                LeaveAction::Reject
            ),
            Err(WorkflowError::OutOfTurn(ReviewTier::Hod))
        );
    }

    #[test]
    fn admin_overrides_any_stage() {
        let state = comp(WorkflowState::pending(), Role::Admin, LeaveAction::Approve).unwrap();
        assert_eq!(state.status, LeaveStatus::Approved);

        let state = comp(
            WorkflowState::recommended(ReviewTier::Hod),
            Role::Admin,
            LeaveAction::Reject,
        )
        .unwrap();
        assert_eq!(state.status, LeaveStatus::Rejected);
        assert_eq!(state.recommended_by, Some(ReviewTier::Hod));
    }

    #[test]
    fn queue_visibility_matches_chain_stage() {
        let hod_recommended = WorkflowState::recommended(ReviewTier::Hod);
        let dir_recommended = WorkflowState::recommended(ReviewTier::Director);

        // Compensatory: Director sees HOD-recommended, Principal does not.
        assert!(is_actionable(LeaveType::Compensatory, hod_recommended, Role::Director));
        assert!(!is_actionable(LeaveType::Compensatory, hod_recommended, Role::Principal));
        assert!(is_actionable(LeaveType::Compensatory, dir_recommended, Role::Principal));
        assert!(!is_actionable(LeaveType::Compensatory, dir_recommended, Role::Director));

        // Standard: anything below the reviewer's tier is visible.
        assert!(is_actionable(LeaveType::Casual, WorkflowState::pending(), Role::Hod));
        assert!(is_actionable(LeaveType::Casual, hod_recommended, Role::Director));
        assert!(!is_actionable(LeaveType::Casual, dir_recommended, Role::Hod));

        // Terminal requests never re-enter any queue.
        let done = WorkflowState {
            status: LeaveStatus::Approved,
            recommended_by: None,
        };
        assert!(!is_actionable(LeaveType::Casual, done, Role::Admin));
        assert!(!is_actionable(LeaveType::Compensatory, done, Role::Principal));

        // Staff never hold a queue.
        assert!(!is_actionable(LeaveType::Casual, WorkflowState::pending(), Role::Staff));
    }

    #[test]
    fn initial_states_by_submitter() {
        assert_eq!(initial_state(Role::Staff), WorkflowState::pending());
        assert_eq!(initial_state(Role::Director), WorkflowState::pending());
        assert_eq!(
            initial_state(Role::Hod),
            WorkflowState::recommended(ReviewTier::Hod)
        );
        assert_eq!(initial_state(Role::Admin).status, LeaveStatus::Approved);
    }
}
