//! The gRPC-style `InputMethods` service: translates wire requests into
//! dispatcher/config-store calls and back into wire responses.
//!
//! Grounded on `examples/original_source/app/server.py`
//! (`InputMethodsService`) for the method surface, realized with `tonic`
//! atop the `prost`-generated types the teacher already depends on for its
//! own `Button`/`Keymap` wire types (see `proto/kontroller.v1.rs`).

use std::sync::Arc;
use std::time::Duration;

use tonic::{Request, Response, Status};

use crate::action::{ActionType, ButtonActionType, KeyOptions};
use crate::button::Button;
use crate::config::ConfigStore;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::hotkey::HotkeyStep;
use crate::key::Key;

/// Generated message/service types, compiled by `build.rs` from
/// `proto/input.proto`.
pub mod proto {
    #![allow(clippy::all, clippy::pedantic, missing_docs)]
    tonic::include_proto!("kontroller.input.v1");
}

use proto::input_methods_server::InputMethods;
use proto::{Config, Empty, Hotkey, Key as WireKey, MouseKey, MouseMove, Response as PbResponse};

/// The service implementation, holding shared handles to the dispatcher
/// and configuration store.
pub struct InputMethodsService {
    dispatcher: Arc<Dispatcher>,
    config: Arc<ConfigStore>,
}

impl InputMethodsService {
    /// Builds a service over the given dispatcher and config store.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, config: Arc<ConfigStore>) -> Self {
        Self { dispatcher, config }
    }
}

fn action_type(raw: i32) -> ActionType {
    match proto::ActionType::try_from(raw).unwrap_or(proto::ActionType::Unspecified) {
        proto::ActionType::Up => ActionType::Up,
        proto::ActionType::Down => ActionType::Down,
        proto::ActionType::Press | proto::ActionType::Unspecified | proto::ActionType::Move => {
            ActionType::Press
        }
    }
}

fn button_action_type(raw: i32) -> ButtonActionType {
    match proto::ActionType::try_from(raw).unwrap_or(proto::ActionType::Unspecified) {
        proto::ActionType::Up => ButtonActionType::Up,
        proto::ActionType::Down => ButtonActionType::Down,
        proto::ActionType::Move => ButtonActionType::Move,
        proto::ActionType::Press | proto::ActionType::Unspecified => ButtonActionType::Press,
    }
}

fn key_options(raw: Option<proto::KeyOptions>) -> KeyOptions {
    raw.map_or_else(KeyOptions::default, |opts| KeyOptions {
        no_repeat: opts.no_repeat,
        disable_unwanted_modifiers: opts.no_modifiers,
    })
}

fn resolve_key(id: u32) -> Result<Key, Status> {
    u16::try_from(id)
        .ok()
        .and_then(Key::from_id)
        .ok_or_else(|| Error::UnknownKey(id.to_string()).into())
}

fn resolve_button(id: u32) -> Result<Button, Status> {
    match id {
        0 => Ok(Button::Left),
        1 => Ok(Button::Right),
        2 => Ok(Button::Middle),
        3 => Ok(Button::Forward),
        4 => Ok(Button::Back),
        other => Err(Error::UnknownKey(other.to_string()).into()),
    }
}

fn ok_response(message: impl Into<String>) -> Response<PbResponse> {
    Response::new(PbResponse {
        message: message.into(),
    })
}

#[tonic::async_trait]
impl InputMethods for InputMethodsService {
    async fn press_key(&self, request: Request<WireKey>) -> Result<Response<PbResponse>, Status> {
        let message = request.into_inner();
        let key = resolve_key(message.id)?;
        let action = action_type(message.r#type);
        let options = key_options(message.options);

        self.dispatcher.press_key(key, action, options)?;
        Ok(ok_response("Ok"))
    }

    async fn press_hotkey(
        &self,
        request: Request<Hotkey>,
    ) -> Result<Response<PbResponse>, Status> {
        let message = request.into_inner();

        if message.steps.is_empty() {
            return Err(Error::MalformedHotkey("no steps".to_string()).into());
        }

        let mut steps = Vec::with_capacity(message.steps.len());
        for step in message.steps {
            steps.push(HotkeyStep {
                key: resolve_key(step.key_id)?,
                action: action_type(step.r#type),
                wait_ms: step.wait_ms,
                speed_ms: step.speed_ms,
            });
        }

        self.dispatcher.play(&steps)?;
        Ok(ok_response("Ok"))
    }

    async fn press_mouse_key(
        &self,
        request: Request<MouseKey>,
    ) -> Result<Response<PbResponse>, Status> {
        let message = request.into_inner();
        let button = resolve_button(message.id)?;
        let action = button_action_type(message.r#type);

        self.dispatcher.press_mouse_key(button, action)?;
        Ok(ok_response("Ok"))
    }

    async fn move_mouse(
        &self,
        request: Request<MouseMove>,
    ) -> Result<Response<PbResponse>, Status> {
        let message = request.into_inner();
        self.dispatcher
            .move_mouse(f64::from(message.x), f64::from(message.y), 0.0, 0.0)?;
        Ok(ok_response("Ok"))
    }

    async fn ping(&self, _request: Request<Empty>) -> Result<Response<PbResponse>, Status> {
        Ok(ok_response("Ok"))
    }

    async fn get_config(&self, _request: Request<Empty>) -> Result<Response<Config>, Status> {
        Ok(Response::new(to_wire_config(&self.config.get()?)))
    }

    async fn set_config(&self, request: Request<Config>) -> Result<Response<Config>, Status> {
        let message = request.into_inner();
        let port = u16::try_from(message.port)
            .map_err(|_| Error::ValueOutOfRange("port must be between 1 and 65535".to_string()))?;

        self.config.set_cursor_speed(message.cursor_speed)?;
        self.config
            .set_cursor_acceleration(message.cursor_acceleration)?;
        self.config
            .set_key_press_interval(message.key_press_interval_ms)?;
        self.dispatcher
            .set_key_press_interval(Duration::from_millis(u64::from(message.key_press_interval_ms)));
        self.config.set_host(message.host)?;
        self.config.set_port(port)?;
        self.config.set_debug(message.debug)?;
        self.config.set_keyboard_path(message.keyboard_path)?;
        self.config.set_mouse_path(message.mouse_path)?;
        self.config.set_media_path(message.media_path)?;

        Ok(Response::new(to_wire_config(&self.config.get()?)))
    }
}

fn to_wire_config(values: &crate::config::Values) -> Config {
    Config {
        cursor_speed: values.cursor_speed,
        cursor_acceleration: values.cursor_acceleration,
        key_press_interval_ms: values.key_press_interval_ms,
        host: values.host.clone(),
        port: u32::from(values.port),
        debug: values.debug,
        keyboard_path: values.keyboard_path.clone(),
        mouse_path: values.mouse_path.clone(),
        media_path: values.media_path.clone(),
    }
}
