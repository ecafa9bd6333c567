#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use waypoint_router::{
    BoxError, BoxFuture, Context, Fixed, Handler, HandlerResult, Outcome, Request, Response,
};

/// Shared log of handler names, in call order.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records `name` and continues.
    pub fn next(&self, name: &str) -> Record {
        self.record(name, Outcome::Next)
    }

    /// A handler that records `name` and stops its phase.
    pub fn stop(&self, name: &str) -> Record {
        self.record(name, Outcome::Stop)
    }

    /// A handler that records `name` and responds with `name` as the body.
    pub fn respond(&self, name: &str) -> Record {
        self.record(name, Outcome::Respond(Response::text(name)))
    }

    pub fn record(&self, name: &str, outcome: Outcome) -> Record {
        Record {
            log: self.clone(),
            name: name.to_string(),
            outcome,
        }
    }

    pub fn push(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct Record {
    log: Log,
    name: String,
    outcome: Outcome,
}

impl<S: Send> Handler<S> for Record {
    fn call<'a>(&'a self, _req: &'a Request, _ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            self.log.push(&self.name);
            Ok(self.outcome.clone())
        })
    }
}

/// A handler that fails with the given message.
pub struct Fail(pub &'static str);

impl<S: Send> Handler<S> for Fail {
    fn call<'a>(&'a self, _req: &'a Request, _ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
        let msg = self.0;
        Box::pin(async move { Err::<Outcome, BoxError>(msg.into()) })
    }
}

pub fn text(body: &str) -> Fixed {
    Fixed(Response::text(body))
}

pub fn body(res: &Response) -> String {
    res.body_string().unwrap_or_default()
}

/// A handler that panics when called.
pub struct Panic(pub &'static str);

impl<S: Send> Handler<S> for Panic {
    fn call<'a>(&'a self, _req: &'a Request, _ctx: &'a mut Context<S>) -> BoxFuture<'a, HandlerResult> {
        panic!("{}", self.0)
    }
}
