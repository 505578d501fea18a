// One-shot AI assessment of a loaded analysis

use ledgerlens_analysis::{summary_payload, AnalysisResult, LabelSet};

use crate::conversation::{blocked_notice, ChatReply, ReplyStatus, NO_DATA_NOTICE};
use crate::error::{ServiceError, ServiceErrorKind};
use crate::prompts::{summary_prompt, summary_role_instruction};
use crate::service::CompletionService;
use crate::session::Session;

/// Submit the summary prompt once. No retry, no session state.
pub fn request_summary(
    service: &dyn CompletionService,
    result: &AnalysisResult,
    labels: &LabelSet,
    language: &str,
) -> Result<String, ServiceError> {
    let prompt = summary_prompt(&summary_payload(result, labels));
    let role = summary_role_instruction(language);
    service.generate(&prompt, Some(&role))
}

/// Summary of the session's current analysis, with failures rendered as text.
/// Conversation state is not touched; an auth failure blocks later AI calls.
pub fn summarize(session: &mut Session, service: &dyn CompletionService) -> ChatReply {
    let Some(loaded) = session.current().cloned() else {
        return ChatReply {
            text: NO_DATA_NOTICE.to_string(),
            status: ReplyStatus::NoData,
        };
    };
    if let Some(reason) = session.service_block() {
        return ChatReply {
            text: blocked_notice(reason),
            status: ReplyStatus::Blocked,
        };
    }

    match request_summary(service, &loaded.result, session.labels(), session.language()) {
        Ok(text) => ChatReply {
            text,
            status: ReplyStatus::Answered,
        },
        Err(e) => {
            log::warn!("summary request failed: {}", e);
            let kind = e.kind();
            if kind == ServiceErrorKind::Auth {
                session.block_service(e.to_string());
            }
            ChatReply {
                text: e.user_message(),
                status: ReplyStatus::ServiceFailed(kind),
            }
        }
    }
}
