use std::collections::HashSet;

use actix_web::{delete, get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::friendship::{
        access::ConnectionGate,
        model::{
            BlockResponse, ConnectedResponse, FriendRequestBody, FriendRequestResponse,
            FriendResponse,
        },
        repository_pg::FriendshipRepositoryPg,
        schema::FriendRequestEntity,
        service::FriendshipService,
    },
    utils::ValidatedJson,
};

pub type FriendshipSvc = FriendshipService<FriendshipRepositoryPg>;

/// Mounted by `route::configure` on both `/friends` and `/friends/`.
pub async fn list_friends(
    friendship_service: web::Data<FriendshipSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let friends = friendship_service.list_friends(user_id).await?;

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}

#[get("/requests")]
pub async fn list_friend_requests(
    friendship_service: web::Data<FriendshipSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendRequestResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let requests = friendship_service.list_friend_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Friend requests retrieved successfully"))
}

#[post("/requests")]
pub async fn send_friend_request(
    friendship_service: web::Data<FriendshipSvc>,
    body: ValidatedJson<FriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let sender_id = get_claims(&req)?.sub;
    let body = body.0;
    let request = friendship_service.add_friend(sender_id, body.recipient_id, body.message).await?;

    Ok(success::Success::created(Some(request)).message("Friend request sent successfully"))
}

#[post("/requests/{user_id}/accept")]
pub async fn accept_friend_request(
    friendship_service: web::Data<FriendshipSvc>,
    requester_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    friendship_service.accept(user_id, *requester_id).await?;

    Ok(success::Success::ok(None).message("Friend request accepted successfully"))
}

#[post("/requests/{user_id}/reject")]
pub async fn reject_friend_request(
    friendship_service: web::Data<FriendshipSvc>,
    requester_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    friendship_service.reject(*requester_id, user_id).await?;

    Ok(success::Success::ok(None).message("Friend request rejected successfully"))
}

#[get("/blocks")]
pub async fn list_blocks(
    friendship_service: web::Data<FriendshipSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<BlockResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let blocks = friendship_service.list_blocks(user_id).await?;

    Ok(success::Success::ok(Some(blocks.into_iter().map(BlockResponse::from).collect()))
        .message("Blocked users retrieved successfully"))
}

#[post("/blocks/{user_id}")]
pub async fn block_user(
    friendship_service: web::Data<FriendshipSvc>,
    blocked_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<BlockResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let block = friendship_service.add_block(user_id, *blocked_id).await?;

    Ok(success::Success::created(Some(BlockResponse::from(block))).message("User blocked"))
}

#[delete("/blocks/{user_id}")]
pub async fn unblock_user(
    friendship_service: web::Data<FriendshipSvc>,
    blocked_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    if !friendship_service.remove_block(user_id, *blocked_id).await? {
        return Err(error::Error::NotFound("Block not found".into()));
    }
    Ok(success::Success::no_content())
}

#[get("/{user_id}/mutual")]
pub async fn mutual_friends(
    friendship_service: web::Data<FriendshipSvc>,
    other_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<HashSet<Uuid>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let mutual = friendship_service.mutual_friends(user_id, *other_id).await?;

    Ok(success::Success::ok(Some(mutual)).message("Mutual friends retrieved successfully"))
}

#[get("/{user_id}/connected")]
pub async fn connected(
    friendship_service: web::Data<FriendshipSvc>,
    other_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<ConnectedResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let connected = friendship_service.are_connected(user_id, *other_id).await;

    Ok(success::Success::ok(Some(ConnectedResponse { connected })))
}

#[delete("/{user_id}")]
pub async fn remove_friend(
    friendship_service: web::Data<FriendshipSvc>,
    friend_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    friendship_service.remove_friend(user_id, *friend_id).await?;
    Ok(success::Success::no_content())
}
