use serde::Serialize;
use shared::coordinates::landmarks;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::watch;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::db;
use crate::history::Board;
use crate::repos::readings::{self, Bucket};

/// Bind the read-only dashboard API and serve it in the background.
pub fn spawn(
    address: SocketAddr,
    board: watch::Receiver<Board>,
    database_path: PathBuf,
) -> anyhow::Result<SocketAddr> {
    let (bound, server) = warp::serve(routes(board, database_path)).try_bind_ephemeral(address)?;
    tokio::spawn(server);
    log::info!("Dashboard API listening on http://{}", bound);
    Ok(bound)
}

pub fn routes(
    board: watch::Receiver<Board>,
    database_path: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health_route = warp::path!("health").map(|| StatusCode::OK);

    let batch_route = warp::path!("batch")
        .and(with_board(board.clone()))
        .and_then(batch);

    let map_route = warp::path!("map")
        .and(with_board(board.clone()))
        .map(|board: watch::Receiver<Board>| {
            let points = board
                .borrow()
                .latest
                .as_ref()
                .map(|s| s.batch.map_points())
                .unwrap_or_default();
            warp::reply::json(&points)
        });

    let landmarks_route = warp::path!("landmarks").map(|| warp::reply::json(&landmarks()));

    let history_route = warp::path!("history")
        .and(with_board(board.clone()))
        .map(|board: watch::Receiver<Board>| {
            let readings: Vec<_> = board.borrow().history.readings().cloned().collect();
            warp::reply::json(&readings)
        });

    let trends_route = warp::path!("trends")
        .and(with_board(board))
        .map(|board: watch::Receiver<Board>| {
            let points = board.borrow().history.trend_points();
            warp::reply::json(&points)
        });

    let stored_trends_route = warp::path!("trends" / Bucket)
        .and(warp::any().map(move || database_path.clone()))
        .and_then(stored_trends);

    let routes = health_route
        .or(batch_route)
        .or(map_route)
        .or(landmarks_route)
        .or(history_route)
        .or(trends_route)
        .or(stored_trends_route);

    warp::get().and(routes).recover(rejection)
}

fn with_board(
    board: watch::Receiver<Board>,
) -> impl Filter<Extract = (watch::Receiver<Board>,), Error = Infallible> + Clone {
    warp::any().map(move || board.clone())
}

pub async fn batch(board: watch::Receiver<Board>) -> Result<impl Reply, Rejection> {
    let latest = board.borrow().latest.clone();
    match latest {
        Some(snapshot) => Ok(warp::reply::json(&snapshot)),
        None => Err(warp::reject::not_found()),
    }
}

pub async fn stored_trends(bucket: Bucket, database_path: PathBuf) -> Result<impl Reply, Rejection> {
    let buckets = tokio::task::spawn_blocking(move || {
        let conn = db::open_read_only(&database_path)?;
        Ok::<_, anyhow::Error>(readings::trend(&conn, bucket)?)
    })
    .await
    .map_err(|e| warp::reject::custom(Error(e.into())))?
    .map_err(|e| warp::reject::custom(Error(e)))?;

    Ok(warp::reply::json(&buckets))
}

#[derive(Debug)]
struct Error(anyhow::Error);
impl warp::reject::Reject for Error {}

#[derive(Serialize)]
struct ErrorMessage {
    code: u16,
    message: String,
}

pub async fn rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found.")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.")
    } else {
        log::error!("Error: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    };

    let json = warp::reply::json(&ErrorMessage {
        code: code.as_u16(),
        message: message.into(),
    });

    Ok(warp::reply::with_status(json, code))
}
