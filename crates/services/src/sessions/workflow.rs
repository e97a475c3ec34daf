use std::sync::Arc;

use url::Url;

use assess_core::model::{AssessmentId, ExpiryLatch, Question, QuestionId};

use super::service::{
    AssessmentSession, EndReason, ExpiryAction, SessionPhase, SubmitOutcome, SubmitTicket,
    SubmitTrigger,
};
use crate::api::AssessmentApi;
use crate::error::{ApiError, SessionError};
use crate::settings::SessionSettings;

fn log_failure(action: &'static str, assessment_id: AssessmentId, err: &ApiError) {
    if err.is_unauthorized() {
        tracing::debug!(%assessment_id, action, "not authorized");
    } else {
        tracing::warn!(%assessment_id, action, error = %err, "assessment service call failed");
    }
}

/// The URL a recorded answer is reachable at once uploaded: the signed
/// destination without its signature.
#[must_use]
pub fn public_audio_url(destination: &str) -> String {
    match Url::parse(destination) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => destination
            .split(['?', '#'])
            .next()
            .unwrap_or(destination)
            .to_string(),
    }
}

/// Drives an `AssessmentSession` against the remote service.
///
/// Each step is also available split (`send`, `close_remote`) for callers
/// that cannot hold the session across the remote call.
#[derive(Clone)]
pub struct SessionLoopService {
    api: Arc<dyn AssessmentApi>,
    settings: SessionSettings,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>, settings: SessionSettings) -> Self {
        Self { api, settings }
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Loads the session state and resolves the starting position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` when the state cannot be fetched and
    /// `SessionError::Empty` when it lists no question.
    pub async fn open_session(
        &self,
        assessment_id: AssessmentId,
        target: Option<QuestionId>,
        latch: ExpiryLatch,
    ) -> Result<AssessmentSession, SessionError> {
        let mut session =
            AssessmentSession::new(assessment_id, latch).with_word_limit(self.settings.word_limit);
        let state = self
            .api
            .fetch_session_state(assessment_id)
            .await
            .inspect_err(|err| log_failure("open session", assessment_id, err))?;

        let position = session
            .hydrate(&state.sections, &state.attempted, target)?
            .clone();
        tracing::info!(
            %assessment_id,
            %position,
            questions = session.sequence().len(),
            attempted = session.ledger().len(),
            "session opened"
        );
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Api` if the question cannot be fetched.
    pub async fn fetch_question(
        &self,
        assessment_id: AssessmentId,
        question_id: QuestionId,
    ) -> Result<Question, SessionError> {
        self.api
            .fetch_question(assessment_id, question_id)
            .await
            .inspect_err(|err| log_failure("fetch question", assessment_id, err))
            .map_err(SessionError::from)
    }

    /// Fetches and attaches content for the current position.
    ///
    /// Returns `false` when the position moved while the fetch was running.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if there is no position or the fetch failed.
    pub async fn load_current_question(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<bool, SessionError> {
        let current = session
            .current()
            .map(|question| question.question_id)
            .ok_or(SessionError::NotReady {
                phase: session.phase(),
            })?;
        let question = self.fetch_question(session.assessment_id(), current).await?;
        Ok(session.attach_question(question))
    }

    /// Sends a ticket's answer. Empty drafts are acknowledged without a call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` from the remote submission.
    pub async fn send(
        &self,
        assessment_id: AssessmentId,
        ticket: &SubmitTicket,
    ) -> Result<(), ApiError> {
        let Some(answer) = ticket.answer() else {
            tracing::debug!(%assessment_id, question = %ticket.question(), "empty draft, nothing sent");
            return Ok(());
        };
        self.api
            .submit_answer(assessment_id, ticket.question(), answer)
            .await
            .inspect_err(|err| log_failure("submit answer", assessment_id, err))
    }

    /// # Errors
    ///
    /// Returns `ApiError` from the remote close.
    pub async fn close_remote(&self, assessment_id: AssessmentId) -> Result<(), ApiError> {
        self.api
            .close_assessment(assessment_id)
            .await
            .inspect_err(|err| log_failure("close assessment", assessment_id, err))
    }

    /// Submits the current draft and applies the result; when an expiry
    /// turned the submission into the end, sends any unsent draft and closes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` from the guards, the remote call, or the close.
    pub async fn submit_current(
        &self,
        session: &mut AssessmentSession,
        trigger: SubmitTrigger,
    ) -> Result<SubmitOutcome, SessionError> {
        let assessment_id = session.assessment_id();
        let ticket = session.begin_submit(trigger)?;
        let result = self.send(assessment_id, &ticket).await;
        let mut outcome = session.finish_submit(ticket, result)?;
        if let SubmitOutcome::ForceSubmit(forced) = outcome {
            tracing::info!(%assessment_id, question = %forced.question(), "time over, sending unsent draft");
            let result = self.send(assessment_id, &forced).await;
            outcome = session.finish_submit(forced, result)?;
        }
        if outcome == SubmitOutcome::Ending {
            self.close(session).await?;
            return Ok(SubmitOutcome::Ended);
        }
        Ok(outcome)
    }

    /// Runs the forced end sequence for an expiry signal.
    ///
    /// With a submission in flight nothing happens here; settling that
    /// submission ends the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only for coordinator refusals; remote failures
    /// after expiry still end the session locally.
    pub async fn handle_expiry(&self, session: &mut AssessmentSession) -> Result<(), SessionError> {
        let assessment_id = session.assessment_id();
        match session.on_expiry() {
            ExpiryAction::ForceSubmit(ticket) => {
                tracing::info!(%assessment_id, question = %ticket.question(), "time over, forcing submission");
                let result = self.send(assessment_id, &ticket).await;
                session.finish_submit(ticket, result)?;
                self.close(session).await
            }
            ExpiryAction::Close => self.close(session).await,
            ExpiryAction::AwaitInFlight => {
                tracing::debug!(%assessment_id, "time over during submission, ending once it settles");
                Ok(())
            }
            ExpiryAction::Ignore => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotReady` unless the session is `Ready`.
    pub fn request_end(&self, session: &mut AssessmentSession) -> Result<(), SessionError> {
        session.request_end()
    }

    /// Confirms the end and closes the remote session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` when closing failed; the session is back in
    /// `EndConfirming` and the user may retry.
    pub async fn confirm_end(&self, session: &mut AssessmentSession) -> Result<(), SessionError> {
        session.confirm_end()?;
        self.close(session).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotReady` outside `EndConfirming`.
    pub fn decline_end(&self, session: &mut AssessmentSession) -> Result<(), SessionError> {
        session.decline_end()
    }

    async fn close(&self, session: &mut AssessmentSession) -> Result<(), SessionError> {
        let assessment_id = session.assessment_id();
        let result = self.close_remote(assessment_id).await;
        if result.is_err() && session.phase() == SessionPhase::Ending(EndReason::Expired) {
            tracing::warn!(%assessment_id, "could not close expired assessment, ending locally");
        }
        session.complete_end(result)?;
        tracing::info!(%assessment_id, "session ended");
        Ok(())
    }

    /// Uploads recorded audio and returns the URL to store with the answer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if no destination was issued or the upload failed.
    pub async fn upload_audio(&self, audio: Vec<u8>) -> Result<String, ApiError> {
        let destination = self
            .api
            .fetch_upload_destination()
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "no upload destination"))?;
        let bytes = audio.len();
        self.api
            .upload_audio(&destination, audio)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, bytes, "audio upload failed"))?;
        Ok(public_audio_url(&destination))
    }

    /// Uploads audio and puts its URL into the current spoken-answer draft.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the upload failed and
    /// `SessionError::QuestionNotLoaded` if the draft is not a spoken one.
    pub async fn upload_spoken_answer(
        &self,
        session: &mut AssessmentSession,
        audio: Vec<u8>,
    ) -> Result<String, SessionError> {
        let url = self.upload_audio(audio).await?;
        if !session.set_audio_url(Some(url.clone())) {
            return Err(SessionError::QuestionNotLoaded);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_drops_signature() {
        assert_eq!(
            public_audio_url("https://blob.example/audio/1.wav?sv=2024&sig=abc"),
            "https://blob.example/audio/1.wav"
        );
        assert_eq!(public_audio_url("not a url?sig=1"), "not a url");
    }
}
