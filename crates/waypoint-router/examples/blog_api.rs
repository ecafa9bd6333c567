//! Blog API Example
//!
//! Builds a small router with every phase in use and replays a few requests
//! through it, printing what comes back.
//! Run with: cargo run --example blog_api
//! Add `-- -v` for debug-level router logs.

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use waypoint_router::{handler, BoxError, Context, Outcome, Request, Response, Router, RouterConfig};

#[derive(Debug, Default)]
struct AppState {
    user: Option<String>,
}

type Ctx = Context<AppState>;

fn build_router() -> Result<Router<AppState>, BoxError> {
    let log_request = handler(|req: &Request, _ctx: &mut Ctx| {
        Box::pin(async move {
            info!(method = %req.method, path = %req.path, "incoming request");
            Ok(Outcome::Next)
        })
    });

    let require_login = handler(|req: &Request, ctx: &mut Ctx| {
        Box::pin(async move {
            match req.get_header("authorization") {
                Some(token) => {
                    ctx.state.user = Some(token.trim_start_matches("Bearer ").to_string());
                    Ok(Outcome::Next)
                }
                None => Ok(Outcome::Respond(Response::new(401).body("login required"))),
            }
        })
    });

    let list_posts = handler(|_req: &Request, _ctx: &mut Ctx| {
        Box::pin(async move {
            let posts = serde_json::json!([
                { "id": 1, "title": "Hello" },
                { "id": 2, "title": "Routing in Rust" },
            ]);
            Ok(Outcome::Respond(Response::json(&posts)))
        })
    });

    let show_post = handler(|_req: &Request, ctx: &mut Ctx| {
        Box::pin(async move {
            match ctx.params.parse::<u32>("id") {
                Some(id) => Ok(Outcome::Respond(Response::json(
                    &serde_json::json!({ "id": id, "title": format!("Post {id}") }),
                ))),
                None => Err(BoxError::from("post id must be a number")),
            }
        })
    });

    let delete_post = handler(|_req: &Request, ctx: &mut Ctx| {
        Box::pin(async move {
            let user = ctx.state.user.clone().unwrap_or_default();
            info!(%user, id = ctx.param("id").unwrap_or_default(), "deleting post");
            Ok(Outcome::Respond(Response::no_content()))
        })
    });

    let not_found = handler(|req: &Request, _ctx: &mut Ctx| {
        Box::pin(async move {
            let body = serde_json::json!({ "error": "not found", "path": req.path });
            Ok(Outcome::Respond(Response::json(&body).status(404)))
        })
    });

    let render_error = handler(|_req: &Request, ctx: &mut Ctx| {
        Box::pin(async move {
            let message = ctx
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            Ok(Outcome::Respond(
                Response::json(&serde_json::json!({ "error": message })).status(500),
            ))
        })
    });

    let stamp = handler(|_req: &Request, ctx: &mut Ctx| {
        Box::pin(async move {
            if let Some(res) = ctx.response.as_mut() {
                res.headers.set("X-Handled-By", "blog-api");
            }
            Ok(Outcome::Next)
        })
    });

    let config = RouterConfig::from_json(
        r#"{"default_headers": [["X-Content-Type-Options", "nosniff"]]}"#,
    )?;

    let posts = Router::with_config(config.clone())
        .handle("GET /", list_posts)?
        .handle("GET /:id", show_post)?
        .filter("DELETE /:id", require_login)?
        .handle("DELETE /:id", delete_post)?;

    let router = Router::with_config(config)
        .hook("*", log_request)?
        .catch("*", render_error)?
        .after("*", stamp)?
        .default_fallback(not_found)
        .append("/api/posts", &posts)?;
    Ok(router)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let verbose = std::env::args().any(|a| a == "-v" || a == "--verbose");
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let router = build_router()?;
    for (phase, pattern) in router.routes() {
        println!("{:<8} {pattern}", phase.as_str());
    }
    println!();

    let requests = [
        Request::get("/api/posts"),
        Request::get("/api/posts/7"),
        Request::get("/api/posts/seven"),
        Request::new("DELETE", "/api/posts/7"),
        Request::new("DELETE", "/api/posts/7").header("Authorization", "Bearer alice"),
        Request::get("/nowhere"),
        Request::new("TRACE", "/api/posts"),
    ];

    for req in &requests {
        let res = router.respond(req).await?;
        println!(
            "{} {} -> {} {}",
            req.method,
            req.path,
            res.status,
            res.body_string().unwrap_or_default()
        );
    }
    Ok(())
}
