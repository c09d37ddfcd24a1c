use std::collections::HashSet;
use std::path::PathBuf;

use canvas::doc::{Annotation, AnnotationId};
use canvas::engine::{Action, EngineCore};
use canvas::geom::Point;
use canvas::hit::{ResizeAnchor, handle_position};
use canvas::input::{Button, Mode};
use clap::{Parser, Subcommand};
use client::{ApiClient, CanvasClient, ClientConfig, ClientError, Session, SessionError};
use serde_json::Value;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; run `annotate login <username> <password>`")]
    LoginRequired,
    #[error(transparent)]
    Client(ClientError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("no annotation with id `{0}`")]
    UnknownAnnotation(String),
    #[error("annotation `{0}` has no grabbable point on the canvas")]
    Unreachable(String),
    #[error("unknown resize anchor `{0}`; expected one of n, ne, e, se, s, sw, w, nw")]
    UnknownAnchor(String),
    #[error("{0}")]
    Refused(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::LoginRequired => Self::LoginRequired,
            other => Self::Client(other),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "annotate", about = "Rectangle annotation canvas CLI")]
struct Cli {
    #[arg(long, env = "ANNOTATE_API_URL", default_value = client::config::DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "ANNOTATE_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and start a session.
    Register { username: String, password: String },
    /// Start a session for an existing account.
    Login { username: String, password: String },
    /// Forget the stored session token.
    Logout,
    /// Print every annotation owned by the session's user.
    List,
    /// Drag out a new rectangle from one corner to the other.
    Draw { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Drag an annotation by an offset.
    Move {
        id: String,
        #[arg(allow_hyphen_values = true)]
        dx: f64,
        #[arg(allow_hyphen_values = true)]
        dy: f64,
    },
    /// Drag one of an annotation's resize handles by an offset.
    Resize {
        id: String,
        /// n, ne, e, se, s, sw, w or nw
        anchor: String,
        #[arg(allow_hyphen_values = true)]
        dx: f64,
        #[arg(allow_hyphen_values = true)]
        dy: f64,
    },
    /// Set the outline color; the fill becomes its translucent variant.
    Recolor { id: String, color: String },
    /// Remove an annotation.
    Delete { id: String },
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let session_file = self
            .session_file
            .clone()
            .unwrap_or_else(client::config::default_session_file);
        ClientConfig::new(self.api_url.clone(), session_file)
    }
}

/// What a command produced, printed by `main`.
#[derive(Debug)]
enum Output {
    Message(String),
    Json(Value),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    match run(cli.command, &config).await? {
        Output::Message(msg) => println!("{msg}"),
        Output::Json(value) => print_json(&value)?,
    }
    Ok(())
}

async fn run(command: Command, config: &ClientConfig) -> Result<Output, CliError> {
    let api = ApiClient::new(&config.api_url);
    let mut session = Session::load(&config.session_file)?;

    match command {
        Command::Register { username, password } => {
            client::canvas_client::register(&api, &mut session, &username, &password).await?;
            Ok(Output::Message(format!("registered {username}")))
        }
        Command::Login { username, password } => {
            client::canvas_client::login(&api, &mut session, &username, &password).await?;
            Ok(Output::Message(format!("logged in as {username}")))
        }
        Command::Logout => {
            session.clear()?;
            Ok(Output::Message("logged out".to_owned()))
        }
        Command::List => {
            let canvas = CanvasClient::open(api, session).await?;
            let all: Vec<&Annotation> = canvas.core().annotations().collect();
            Ok(Output::Json(serde_json::to_value(all)?))
        }
        Command::Draw { x1, y1, x2, y2 } => {
            let mut canvas = CanvasClient::open(api, session).await?;
            run_draw(&mut canvas, Point::new(x1, y1), Point::new(x2, y2)).await
        }
        Command::Move { id, dx, dy } => {
            let mut canvas = CanvasClient::open(api, session).await?;
            run_move(&mut canvas, &AnnotationId::from(id.as_str()), Point::new(dx, dy)).await
        }
        Command::Resize { id, anchor, dx, dy } => {
            let anchor = parse_anchor(&anchor)?;
            let mut canvas = CanvasClient::open(api, session).await?;
            run_resize(&mut canvas, &AnnotationId::from(id.as_str()), anchor, Point::new(dx, dy)).await
        }
        Command::Recolor { id, color } => {
            let mut canvas = CanvasClient::open(api, session).await?;
            let id = AnnotationId::from(id.as_str());
            select(&mut canvas, &id).await?;
            canvas.try_apply(|core| core.set_color(&color)).await?;
            remote_copy(&mut canvas, &id).await
        }
        Command::Delete { id } => {
            let mut canvas = CanvasClient::open(api, session).await?;
            run_delete(&mut canvas, &AnnotationId::from(id.as_str())).await
        }
    }
}

fn parse_anchor(name: &str) -> Result<ResizeAnchor, CliError> {
    ResizeAnchor::from_name(name).ok_or_else(|| CliError::UnknownAnchor(name.to_owned()))
}

fn offset(pt: Point, delta: Point) -> Point {
    Point::new(pt.x + delta.x, pt.y + delta.y)
}

/// Press, move and release the primary button.
fn gesture(core: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    let mut actions = core.on_pointer_down(from, Button::Primary);
    actions.extend(core.on_pointer_move(to));
    actions.extend(core.on_pointer_up(to, Button::Primary));
    actions
}

fn grab_point(canvas: &CanvasClient, id: &AnnotationId) -> Result<Point, CliError> {
    if canvas.core().annotation(id).is_none() {
        return Err(CliError::UnknownAnnotation(id.to_string()));
    }
    canvas
        .core()
        .grab_point(id)
        .ok_or_else(|| CliError::Unreachable(id.to_string()))
}

/// Enter select mode and click the annotation.
async fn select(canvas: &mut CanvasClient, id: &AnnotationId) -> Result<(), CliError> {
    let at = grab_point(canvas, id)?;
    canvas.try_apply(|core| core.set_mode(Mode::Select)).await?;
    canvas.apply(|core| gesture(core, at, at)).await?;
    if canvas.core().selection() != Some(id) {
        return Err(CliError::Unreachable(id.to_string()));
    }
    Ok(())
}

async fn run_draw(canvas: &mut CanvasClient, from: Point, to: Point) -> Result<Output, CliError> {
    let before: HashSet<AnnotationId> = canvas.core().annotations().map(|a| a.id.clone()).collect();
    canvas.try_apply(|core| core.set_mode(Mode::Draw)).await?;
    canvas.apply(|core| gesture(core, from, to)).await?;

    let Some(id) = canvas
        .core()
        .annotations()
        .map(|a| a.id.clone())
        .find(|id| !before.contains(id))
    else {
        return Err(CliError::Refused("nothing was drawn; the rectangle is too small, off the canvas, or starts on an existing annotation"));
    };
    remote_copy(canvas, &id).await
}

async fn run_move(canvas: &mut CanvasClient, id: &AnnotationId, delta: Point) -> Result<Output, CliError> {
    let at = grab_point(canvas, id)?;
    canvas.try_apply(|core| core.set_mode(Mode::Select)).await?;
    canvas.apply(|core| gesture(core, at, offset(at, delta))).await?;
    remote_copy(canvas, id).await
}

async fn run_resize(canvas: &mut CanvasClient, id: &AnnotationId, anchor: ResizeAnchor, delta: Point) -> Result<Output, CliError> {
    select(canvas, id).await?;
    let Some(bounds) = canvas.core().annotation(id).map(Annotation::bounds) else {
        return Err(CliError::UnknownAnnotation(id.to_string()));
    };
    let at = handle_position(&bounds, anchor);
    canvas.apply(|core| gesture(core, at, offset(at, delta))).await?;
    remote_copy(canvas, id).await
}

async fn run_delete(canvas: &mut CanvasClient, id: &AnnotationId) -> Result<Output, CliError> {
    select(canvas, id).await?;
    canvas.apply(EngineCore::delete_selected).await?;
    canvas.reload().await?;
    if canvas.core().annotation(id).is_some() {
        return Err(CliError::Refused("the service kept the annotation"));
    }
    Ok(Output::Message(format!("deleted {id}")))
}

/// Reload from the service and return its copy of `id`.
async fn remote_copy(canvas: &mut CanvasClient, id: &AnnotationId) -> Result<Output, CliError> {
    canvas.reload().await?;
    let Some(annotation) = canvas.core().annotation(id) else {
        return Err(CliError::Refused("the service has no record of the annotation"));
    };
    Ok(Output::Json(serde_json::to_value(annotation)?))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
