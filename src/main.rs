//! HTTP transport for the resource explorer: routing, parameter binding,
//! response streaming. All exploration logic lives behind [Explorer].
mod classify;
mod config;
mod error;
mod explore;
mod format;
mod rdf;
mod resolve;
mod resource;

use crate::config::Config;
use crate::error::ExploreError;
use crate::explore::Explorer;
use crate::format::RdfFormat;
use crate::rdf::{describe_query, GraphStore};
use actix_web::web::Bytes;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder, Scope};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use tinytemplate::TinyTemplate;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

static TEMPLATE: &str = std::include_str!("../data/explore.html");
static CSS: &str = std::include_str!("../data/explore.css");
static JS: &str = std::include_str!("../data/explore.js");

#[derive(Deserialize)]
struct DescribeParams {
    uri: Option<String>,
    format: Option<String>,
}

#[derive(Deserialize)]
struct HtmlParams {
    uri: Option<String>,
    resource_prefix: Option<String>,
}

#[derive(Deserialize)]
struct UriParam {
    uri: Option<String>,
}

#[derive(Serialize)]
struct HtmlContext {
    uri: String,
    resource_prefix: String,
}

fn required(value: &Option<String>) -> Result<&str, ExploreError> {
    value.as_deref().ok_or(ExploreError::MissingParameter("uri"))
}

/// io::Write adapter feeding serialized chunks into the response body
/// stream. When the client disconnects the receiver is dropped, the next
/// write fails and the serializer aborts instead of running to completion.
struct ChannelWriter(mpsc::Sender<Result<Bytes, ExploreError>>);

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "response channel closed"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Shared shape of the JSON views: bind the uri parameter, run the
/// classification on a blocking thread, return the payload as JSON.
async fn classified<T, F>(explorer: &web::Data<Explorer>, uri: &Option<String>, f: F) -> Result<HttpResponse, ExploreError>
where
    T: Serialize + Send + 'static,
    F: FnOnce(Explorer, String) -> Result<T, ExploreError> + Send + 'static,
{
    let raw = required(uri)?.to_owned();
    let explorer = explorer.get_ref().clone();
    let payload = web::block(move || f(explorer, raw)).await.map_err(|_| ExploreError::Interrupted)??;
    Ok(HttpResponse::Ok().json(payload))
}

#[get("")]
async fn describe(explorer: web::Data<Explorer>, params: web::Query<DescribeParams>) -> Result<HttpResponse, ExploreError> {
    let raw = required(&params.uri)?;
    let uri = explorer.resolve(raw)?.ok_or(ExploreError::MissingParameter("uri"))?;
    let format = RdfFormat::resolve(params.format.as_deref());
    log::trace!("querying for graph as {}", format.name());
    let query = describe_query(&uri);
    let store = explorer.store();
    let (tx, rx) = mpsc::channel::<Result<Bytes, ExploreError>>(8);
    actix_web::rt::task::spawn_blocking(move || {
        let mut out = ChannelWriter(tx.clone());
        if let Err(e) = store.query(&query, format, &mut out) {
            log::warn!("describe stream aborted: {e}");
            let _ = tx.blocking_send(Err(e.into()));
        }
    });
    Ok(HttpResponse::Ok().content_type(format.content_type()).streaming(ReceiverStream::new(rx)))
}

#[get("/html")]
async fn html_view(explorer: web::Data<Explorer>, params: web::Query<HtmlParams>) -> Result<HttpResponse, ExploreError> {
    let raw = required(&params.uri)?;
    let uri = explorer.resolve(raw)?.ok_or(ExploreError::MissingParameter("uri"))?;
    let mut tt = TinyTemplate::new();
    tt.add_template("explore", TEMPLATE).expect("embedded template is valid");
    let context =
        HtmlContext { uri: uri.to_string(), resource_prefix: params.resource_prefix.clone().unwrap_or_default() };
    let body = tt.render("explore", &context).map_err(|e| {
        log::error!("cannot render explore template: {e}");
        ExploreError::Interrupted
    })?;
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body))
}

#[get("/resourceTypes")]
async fn resource_types(explorer: web::Data<Explorer>, params: web::Query<UriParam>) -> Result<HttpResponse, ExploreError> {
    classified(&explorer, &params.uri, |ex, uri| ex.types(&uri)).await
}

#[get("/resourceAllTypes")]
async fn resource_all_types(
    explorer: web::Data<Explorer>,
    params: web::Query<UriParam>,
) -> Result<HttpResponse, ExploreError> {
    classified(&explorer, &params.uri, |ex, uri| ex.all_types(&uri)).await
}

#[get("/relatedToObjects")]
async fn related_to_objects(
    explorer: web::Data<Explorer>,
    params: web::Query<UriParam>,
) -> Result<HttpResponse, ExploreError> {
    classified(&explorer, &params.uri, |ex, uri| ex.related_to_objects(&uri)).await
}

#[get("/resourceTopObjects")]
async fn resource_top_objects(
    explorer: web::Data<Explorer>,
    params: web::Query<UriParam>,
) -> Result<HttpResponse, ExploreError> {
    log::trace!("getting top objects");
    classified(&explorer, &params.uri, |ex, uri| ex.top_objects(&uri)).await
}

#[get("/relatedFromSubjects")]
async fn related_from_subjects(
    explorer: web::Data<Explorer>,
    params: web::Query<UriParam>,
) -> Result<HttpResponse, ExploreError> {
    classified(&explorer, &params.uri, |ex, uri| ex.related_from_subjects(&uri)).await
}

#[get("/resourceShortDescription")]
async fn resource_short_description(
    explorer: web::Data<Explorer>,
    params: web::Query<UriParam>,
) -> Result<HttpResponse, ExploreError> {
    log::trace!("getting short description");
    classified(&explorer, &params.uri, |ex, uri| ex.short_description(&uri)).await
}

#[get("/resourceDepictions")]
async fn resource_depictions(
    explorer: web::Data<Explorer>,
    params: web::Query<UriParam>,
) -> Result<HttpResponse, ExploreError> {
    log::trace!("getting image urls");
    classified(&explorer, &params.uri, |ex, uri| ex.depictions(&uri)).await
}

#[get("/explore.css")]
async fn css() -> impl Responder {
    HttpResponse::Ok().content_type("text/css; charset=utf-8").body(CSS)
}

#[get("/explore.js")]
async fn js() -> impl Responder {
    HttpResponse::Ok().content_type("application/javascript; charset=utf-8").body(JS)
}

fn explore_scope() -> Scope {
    web::scope("/explore")
        .service(css)
        .service(js)
        .service(html_view)
        .service(resource_types)
        .service(resource_all_types)
        .service(related_to_objects)
        .service(resource_top_objects)
        .service(related_from_subjects)
        .service(resource_short_description)
        .service(resource_depictions)
        .service(describe)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {e}. Check data/config.toml and LODEVIEW_* environment variables.");
        std::process::exit(1);
    });
    env_logger::Builder::new().parse_filters(config.log_level.as_deref().unwrap_or("info")).init();
    let store = Arc::new(GraphStore::load(&config));
    let explorer = Explorer::new(&config, store).unwrap_or_else(|e| {
        log::error!("{e}");
        std::process::exit(1);
    });
    let data = web::Data::new(explorer);
    log::info!("explorer listening on http://{}:{}/explore", config.host, config.port);
    HttpServer::new(move || App::new().app_data(data.clone()).service(explore_scope()))
        .bind((config.host.clone(), config.port))?
        .run()
        .await
}
