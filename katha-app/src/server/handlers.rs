//! Route handlers.
//!
//! Every story route takes the session lock with `try_lock`, so a second
//! request for the same visitor while the backend is still answering gets
//! [`Error::Busy`] instead of queueing behind the first.

use axum::Json;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use katha::Error;
use katha::audio::SpeechResponse;
use katha::story::{ModelChoice, StoryParameters, StorySession};
use serde::Deserialize;
use serde_json::{Value, json};

use super::cookie::SessionCookie;
use super::error::PlainError;
use super::page::{FormValues, PageView};
use super::state::AppState;

const STILL_WORKING: &str = "The storyteller is still working on your previous request.";

/// Fields of the story form. Empty selections fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoryForm {
    topic: String,
    genre: String,
    tone: String,
    length: String,
    characters: String,
    model: String,
}

impl StoryForm {
    fn parameters(&self) -> katha::Result<StoryParameters> {
        let mut params = StoryParameters::new(self.topic.as_str());
        if !self.genre.trim().is_empty() {
            params = params.genre(self.genre.parse()?);
        }
        if !self.tone.trim().is_empty() {
            params = params.tone(self.tone.parse()?);
        }
        if !self.length.trim().is_empty() {
            params = params.length(self.length.parse()?);
        }
        if !self.characters.trim().is_empty() {
            params = params.characters(self.characters.as_str());
        }
        Ok(params)
    }

    /// Everything a new tale needs, checked before the session is touched.
    fn request(&self, state: &AppState) -> katha::Result<(StoryParameters, String)> {
        let params = self.parameters()?;
        params.validate()?;
        let model = state.backends().resolve_model(self.model_choice()?)?;
        Ok((params, model.to_owned()))
    }

    fn model_choice(&self) -> katha::Result<ModelChoice> {
        if self.model.trim().is_empty() {
            Ok(ModelChoice::default())
        } else {
            self.model.parse()
        }
    }

    fn values(&self) -> FormValues {
        let defaults = FormValues::default();
        let or_default = |v: &str, d: String| if v.trim().is_empty() { d } else { v.to_owned() };
        FormValues {
            topic: self.topic.clone(),
            genre: or_default(&self.genre, defaults.genre),
            tone: or_default(&self.tone, defaults.tone),
            length: or_default(&self.length, defaults.length),
            characters: self.characters.clone(),
            model: or_default(&self.model, defaults.model),
            instruction: String::new(),
        }
    }
}

/// Fields of the revision form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviseForm {
    instruction: String,
}

fn respond(state: &AppState, cookie: SessionCookie, view: &PageView) -> Response {
    match state.page().render(view) {
        Ok(html) => cookie.apply((view.status(), Html(html))),
        Err(e) => {
            tracing::error!(error = %e, "page render failed");
            cookie.apply((
                StatusCode::INTERNAL_SERVER_ERROR,
                "The page could not be rendered.",
            ))
        }
    }
}

fn report(view: &mut PageView, err: &Error) {
    if err.is_user_error() {
        tracing::debug!(error = %err, "request rejected");
    } else {
        tracing::warn!(error = %err, "story request failed");
    }
    view.fail(err);
}

/// Show the visitor's current story, if they have one.
fn show_story(state: &AppState, cookie: &SessionCookie, view: &mut PageView) {
    let Some(session) = state.find_session(cookie.id) else {
        return;
    };
    match session.try_lock() {
        Ok(session) => view.story = session.current().map(str::to_owned),
        Err(_) => view.inform(STILL_WORKING),
    }
}

/// `GET /`
pub async fn index(State(state): State<AppState>, cookie: SessionCookie) -> Response {
    let mut view = PageView::new(state.backends());
    show_story(&state, &cookie, &mut view);
    respond(&state, cookie, &view)
}

/// Generate with `model`, keeping the session's previous model if it fails.
async fn weave(session: &mut StorySession, params: &StoryParameters, model: String) -> katha::Result<()> {
    let previous = session.model().to_owned();
    session.set_model(Some(model));
    if let Err(e) = session.generate(params).await {
        session.set_model(Some(previous));
        return Err(e);
    }
    Ok(())
}

/// `POST /story`
pub async fn generate(
    State(state): State<AppState>,
    cookie: SessionCookie,
    Form(form): Form<StoryForm>,
) -> Response {
    let mut view = PageView::new(state.backends());
    view.form = form.values();

    let (params, model) = match form.request(&state) {
        Ok(request) => request,
        Err(e) => {
            report(&mut view, &e);
            show_story(&state, &cookie, &mut view);
            return respond(&state, cookie, &view);
        }
    };

    let session = state.session(cookie.id);
    match session.try_lock() {
        Ok(mut session) => {
            if let Err(e) = weave(&mut session, &params, model).await {
                report(&mut view, &e);
            }
            view.story = session.current().map(str::to_owned);
        }
        Err(_) => report(&mut view, &Error::Busy),
    }
    respond(&state, cookie, &view)
}

/// `POST /story/revise`
pub async fn revise(
    State(state): State<AppState>,
    cookie: SessionCookie,
    Form(form): Form<ReviseForm>,
) -> Response {
    let mut view = PageView::new(state.backends());
    let session = state.session_or_blank(cookie.id);

    match session.try_lock() {
        Ok(mut session) => {
            if let Err(e) = session.revise(&form.instruction).await {
                view.form.instruction = form.instruction;
                report(&mut view, &e);
            }
            view.story = session.current().map(str::to_owned);
        }
        Err(_) => report(&mut view, &Error::Busy),
    }
    respond(&state, cookie, &view)
}

/// `POST /story/reset`
pub async fn reset(State(state): State<AppState>, cookie: SessionCookie) -> Response {
    let Some(session) = state.find_session(cookie.id) else {
        return cookie.apply(Redirect::to("/"));
    };

    let Ok(mut session) = session.try_lock() else {
        let mut view = PageView::new(state.backends());
        report(&mut view, &Error::Busy);
        return respond(&state, cookie, &view);
    };
    session.reset();
    cookie.apply(Redirect::to("/"))
}

async fn narrate(state: &AppState, session: &StorySession) -> Option<katha::Result<SpeechResponse>> {
    let narrator = state.backends().narrator.as_ref()?;
    Some(match session.current() {
        Some(story) => narrator.narrate(story).await,
        None => Err(Error::NoStory),
    })
}

/// `POST /story/listen`
pub async fn listen(State(state): State<AppState>, cookie: SessionCookie) -> Response {
    let mut view = PageView::new(state.backends());
    let session = state.session_or_blank(cookie.id);

    match session.try_lock() {
        Ok(session) => {
            view.story = session.current().map(str::to_owned);
            match narrate(&state, &session).await {
                Some(Ok(audio)) => view.audio_url = Some(audio.to_data_url()),
                Some(Err(e)) => report(&mut view, &e),
                None => {
                    view.inform("Narration is turned off.");
                    view.set_status(StatusCode::NOT_FOUND);
                }
            }
        }
        Err(_) => report(&mut view, &Error::Busy),
    }
    respond(&state, cookie, &view)
}

/// `GET /story/audio`
pub async fn audio(State(state): State<AppState>, cookie: SessionCookie) -> Response {
    let session = state.session_or_blank(cookie.id);

    let result = match session.try_lock() {
        Ok(session) => narrate(&state, &session).await,
        Err(_) => Some(Err(Error::Busy)),
    };

    let response = match result {
        Some(Ok(audio)) => (
            [(CONTENT_TYPE, audio.format.mime_type())],
            audio.audio,
        )
            .into_response(),
        Some(Err(e)) => PlainError(e).into_response(),
        None => (StatusCode::NOT_FOUND, "Narration is turned off.").into_response(),
    };
    cookie.apply(response)
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "provider": state.backends().chat.provider_name(),
        "sessions": state.session_count(),
    }))
}
