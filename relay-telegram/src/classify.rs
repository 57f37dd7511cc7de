//! Response classification tables.
//!
//! The Bot API reports failures as a description string such as
//! `"Bad Request: user not found"`. The leading phrase is the HTTP reason of the documented
//! response code, so it is mapped back to that code here, and decisions are keyed by the code.
//! A description that matches no row has no code, and falls through to the caller's default.

use relay_core::Membership;

use crate::api::ApiFailure;

/// Description prefix to documented response code.
const RESPONSE_CODES: &[(&str, u16)] = &[
    ("Bad Request", 400),
    ("Unauthorized", 401),
    ("Forbidden", 403),
    ("Not Found", 404),
    ("Conflict", 409),
    ("Too Many Requests", 429),
];

/// Rejections of `getChatMember` that are a valid answer rather than a failure.
/// 400 covers users who were never in the chat or cannot be resolved there, minus the
/// descriptions in [`CHAT_FAULTS`].
const MEMBERSHIP_BY_CODE: &[(u16, Membership)] = &[(400, Membership::NotMember)];

/// 400 descriptions that blame the chat rather than the user. These stay lookup failures.
const CHAT_FAULTS: &[&str] = &["chat not found", "group chat was upgraded"];

/// Documented response code for a platform error description.
pub fn response_code(description: &str) -> Option<u16> {
    let description = description.trim_start();
    RESPONSE_CODES
        .iter()
        .find(|(prefix, _)| {
            description
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
        })
        .map(|&(_, code)| code)
}

/// Membership implied by a failed lookup, if any. `None` means the lookup really failed.
pub fn membership_for_failure(failure: &ApiFailure) -> Option<Membership> {
    let code = failure.code()?;
    if let ApiFailure::Rejected { description, .. } = failure {
        let description = description.to_ascii_lowercase();
        if CHAT_FAULTS.iter().any(|fault| description.contains(fault)) {
            return None;
        }
    }
    MEMBERSHIP_BY_CODE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, membership)| membership)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_code_prefixes() {
        assert_eq!(response_code("Bad Request: user not found"), Some(400));
        assert_eq!(response_code("Bad Request: PARTICIPANT_ID_INVALID"), Some(400));
        assert_eq!(response_code("Forbidden: bot was kicked from the group chat"), Some(403));
        assert_eq!(response_code("Unauthorized"), Some(401));
        assert_eq!(response_code("Too Many Requests: retry after 5"), Some(429));
    }

    #[test]
    fn test_unknown_descriptions_have_no_code() {
        assert_eq!(response_code("Internal Server Error"), None);
        assert_eq!(response_code("Bad Requests are fun"), None);
        assert_eq!(response_code(""), None);
    }

    #[test]
    fn test_only_bad_request_means_not_member() {
        let bad = ApiFailure::rejected(Some(400), "Bad Request: user not found");
        assert_eq!(membership_for_failure(&bad), Some(Membership::NotMember));

        let forbidden = ApiFailure::rejected(Some(403), "Forbidden: bot is not a member");
        assert_eq!(membership_for_failure(&forbidden), None);

        let unknown = ApiFailure::rejected(None, "Something new");
        assert_eq!(membership_for_failure(&unknown), None);

        let timeout = ApiFailure::Timeout("deadline".into());
        assert_eq!(membership_for_failure(&timeout), None);
    }

    #[test]
    fn test_chat_faults_are_not_membership_answers() {
        let missing_chat = ApiFailure::rejected(Some(400), "Bad Request: chat not found");
        assert_eq!(membership_for_failure(&missing_chat), None);

        let upgraded = ApiFailure::rejected(
            Some(400),
            "Bad Request: group chat was upgraded to a supergroup chat",
        );
        assert_eq!(membership_for_failure(&upgraded), None);

        let never_joined = ApiFailure::rejected(Some(400), "Bad Request: member not found");
        assert_eq!(membership_for_failure(&never_joined), Some(Membership::NotMember));
    }
}
