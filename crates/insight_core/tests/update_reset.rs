use insight_core::{
    update, AppState, Effect, Existence, HandleValidation, Msg, Screen, Session,
    ValidationOutcome,
};

fn mid_poll_state() -> AppState {
    let state = AppState::new(true);
    let (state, _) = update(
        state,
        Msg::SubmitRequested {
            handle: Some("creator1".to_string()),
        },
    );
    let (state, _) = update(
        state,
        Msg::ValidationFinished {
            generation: 1,
            on_submit: true,
            outcome: ValidationOutcome::Verified(HandleValidation {
                exists: Existence::Yes,
                message: String::new(),
                existing: None,
            }),
        },
    );
    let (state, _) = update(
        state,
        Msg::LaunchFinished {
            outcome: Ok("run_42".to_string()),
        },
    );
    state
}

#[test]
fn reset_mid_poll_clears_timers_and_job() {
    let state = mid_poll_state();
    let (state, effects) = update(state, Msg::ResetRequested);

    assert_eq!(
        effects,
        vec![Effect::CancelValidation, Effect::StopPolling]
    );
    assert_eq!(state.view().screen, Screen::Input);
    assert_eq!(state.handle(), "");
    assert!(!matches!(state.session(), Session::Analyzing(_)));
}

#[test]
fn reset_is_idempotent() {
    let state = mid_poll_state();
    let (state, _) = update(state, Msg::ResetRequested);
    let (state, effects) = update(state, Msg::ResetRequested);

    assert_eq!(
        effects,
        vec![Effect::CancelValidation, Effect::StopPolling]
    );
    assert_eq!(state.view().screen, Screen::Input);
}

#[test]
fn reset_without_entitlement_returns_to_paywall() {
    let state = mid_poll_state();
    let (state, _) = update(state, Msg::EntitlementChanged(false));
    let (state, _) = update(state, Msg::ResetRequested);

    assert_eq!(state.view().screen, Screen::Paywall);
}

#[test]
fn late_replies_after_reset_are_discarded() {
    let state = mid_poll_state();
    let (state, _) = update(state, Msg::ResetRequested);

    // The old job's poll replies and validation replies must be inert.
    let (state, effects) = update(
        state,
        Msg::PollObserved {
            run_id: "run_42".to_string(),
            poll_count: 5,
            status: insight_core::JobStatus::Completed,
            error_message: None,
        },
    );
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::ValidationFinished {
            generation: 1,
            on_submit: true,
            outcome: ValidationOutcome::Rejected { message: None },
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().screen, Screen::Input);
    assert!(state.view().handle_error.is_none());
}

#[test]
fn retry_from_error_preserves_the_handle() {
    let state = mid_poll_state();
    let (state, _) = update(
        state,
        Msg::PollObserved {
            run_id: "run_42".to_string(),
            poll_count: 2,
            status: insight_core::JobStatus::Failed,
            error_message: None,
        },
    );
    assert_eq!(state.view().screen, Screen::Error);

    let (state, effects) = update(state, Msg::RetryFromError);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.screen, Screen::Input);
    assert_eq!(view.handle, "creator1");
    assert!(view.handle_error.is_none());
}

#[test]
fn entitlement_toggles_between_paywall_and_input() {
    let state = AppState::new(false);
    assert_eq!(state.view().screen, Screen::Paywall);

    let (state, _) = update(state, Msg::EntitlementChanged(true));
    assert_eq!(state.view().screen, Screen::Input);

    let (state, _) = update(state, Msg::EntitlementChanged(false));
    assert_eq!(state.view().screen, Screen::Paywall);
}
