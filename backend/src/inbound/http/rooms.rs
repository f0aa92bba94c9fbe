//! Room directory HTTP handlers.
//!
//! ```text
//! GET    /api/v1/rooms?status=           List rooms
//! GET    /api/v1/rooms/available         List available rooms
//! GET    /api/v1/rooms/number/{number}   Find a room by its number
//! GET    /api/v1/rooms/{id}              Fetch a room
//! POST   /api/v1/rooms                   Register a room
//! PUT    /api/v1/rooms/{id}/status       Compare-and-set the room status
//! POST   /api/v1/rooms/{id}/maintenance  Take a room out of service
//! DELETE /api/v1/rooms/{id}/maintenance  Return a room to service
//! ```
//!
//! The status endpoint is the wire form of the room directory port: remote
//! orchestrators call it, and refusals carry `currentStatus` (409) or
//! `from`/`to` (422) in the error details.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

use crate::domain::ports::{RoomFilter, SetRoomStatusRequest};
use crate::domain::{Room, RoomDraft, RoomId, RoomStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Query accepted by the room listing.
#[derive(Debug, Default, Deserialize)]
pub struct RoomListQuery {
    /// Restrict the listing to one status.
    #[serde(default)]
    pub status: Option<RoomStatus>,
}

/// List rooms, optionally filtered.
#[get("/rooms")]
pub async fn list_rooms(
    state: web::Data<HttpState>,
    query: web::Query<RoomListQuery>,
) -> ApiResult<web::Json<Vec<Room>>> {
    let filter = query
        .into_inner()
        .status
        .map_or(RoomFilter::All, RoomFilter::Status);
    Ok(web::Json(state.rooms.list_rooms(filter).await?))
}

/// Rooms currently Available.
#[get("/rooms/available")]
pub async fn list_available_rooms(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Room>>> {
    let rooms = state
        .rooms
        .list_rooms(RoomFilter::Status(RoomStatus::Available))
        .await?;
    Ok(web::Json(rooms))
}

/// Fetch one room by its number.
#[get("/rooms/number/{room_number}")]
pub async fn get_room_by_number(
    state: web::Data<HttpState>,
    room_number: web::Path<String>,
) -> ApiResult<web::Json<Room>> {
    let room = state.rooms.get_room_by_number(&room_number).await?;
    Ok(web::Json(room))
}

/// Fetch one room by id.
#[get("/rooms/{id}")]
pub async fn get_room(
    state: web::Data<HttpState>,
    id: web::Path<RoomId>,
) -> ApiResult<web::Json<Room>> {
    Ok(web::Json(state.rooms.get_room(id.into_inner()).await?))
}

/// Register a room as Available.
#[post("/rooms")]
pub async fn register_room(
    state: web::Data<HttpState>,
    payload: web::Json<RoomDraft>,
) -> ApiResult<HttpResponse> {
    let room = state.rooms.register_room(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(room))
}

/// Compare-and-set a room's status.
#[put("/rooms/{id}/status")]
pub async fn set_room_status(
    state: web::Data<HttpState>,
    id: web::Path<RoomId>,
    payload: web::Json<SetRoomStatusRequest>,
) -> ApiResult<web::Json<Room>> {
    let change = payload.into_inner().for_room(id.into_inner());
    Ok(web::Json(state.rooms.change_status(change).await?))
}

/// Take an Available room out of service.
#[post("/rooms/{id}/maintenance")]
pub async fn start_maintenance(
    state: web::Data<HttpState>,
    id: web::Path<RoomId>,
) -> ApiResult<web::Json<Room>> {
    Ok(web::Json(state.rooms.start_maintenance(id.into_inner()).await?))
}

/// Return a room from maintenance to Available.
#[delete("/rooms/{id}/maintenance")]
pub async fn finish_maintenance(
    state: web::Data<HttpState>,
    id: web::Path<RoomId>,
) -> ApiResult<web::Json<Room>> {
    Ok(web::Json(state.rooms.finish_maintenance(id.into_inner()).await?))
}
