//! In-crate fakes for the screen collaborators.

use crate::{
    AuthError, Navigator, Notification, Notifier, RemoteError, Resource, Route,
    SessionEstablisher, Transport,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Clone, Debug)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    result: Result<Value, RemoteError>,
}

/// Transport answering from a per-path script. The last reply for a path is
/// repeated once the queue is down to one entry.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Call>>,
    token: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, path: &str, result: Result<Value, RemoteError>) -> &Self {
        self.reply_after(path, Duration::ZERO, result)
    }

    pub fn reply_after(
        &self,
        path: &str,
        delay: Duration,
        result: Result<Value, RemoteError>,
    ) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted { delay, result });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    async fn answer(&self, method: Method, resource: &Resource, body: Option<Value>) -> Result<Value, RemoteError> {
        let path = resource.to_string();
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.clone(),
            body,
        });

        let scripted = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&path) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let Some(scripted) = scripted else {
            return Err(RemoteError::transport(format!("no reply scripted for {}", path)));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, resource: &Resource) -> Result<Value, RemoteError> {
        self.answer(Method::Get, resource, None).await
    }

    async fn post(&self, resource: &Resource, body: Value) -> Result<Value, RemoteError> {
        self.answer(Method::Post, resource, Some(body)).await
    }

    fn set_auth_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notification: Notification) {
        self.shown.lock().unwrap().push(notification);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEvent {
    Back,
    To(Route),
}

#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
}

impl RecordingNavigator {
    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_back(&self) {
        self.events.lock().unwrap().push(NavEvent::Back);
    }

    fn navigate_to(&self, route: Route) {
        self.events.lock().unwrap().push(NavEvent::To(route));
    }
}

/// Session establisher that records sign-in attempts
#[derive(Default)]
pub struct MockEstablisher {
    attempts: Mutex<Vec<(String, String)>>,
    failure: Mutex<Option<RemoteError>>,
}

impl MockEstablisher {
    pub fn failing(err: RemoteError) -> Self {
        Self {
            attempts: Mutex::default(),
            failure: Mutex::new(Some(err)),
        }
    }

    pub fn succeed_from_now(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionEstablisher for MockEstablisher {
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.attempts
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}
