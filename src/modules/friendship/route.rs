use crate::modules::friendship::handle::*;
use actix_web::web::{self, scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    // literal segments are registered ahead of the `{user_id}` patterns
    cfg.service(
        scope("/friends")
            .service(web::resource(["", "/"]).route(web::get().to(list_friends)))
            .service(list_friend_requests)
            .service(send_friend_request)
            .service(accept_friend_request)
            .service(reject_friend_request)
            .service(list_blocks)
            .service(block_user)
            .service(unblock_user)
            .service(mutual_friends)
            .service(connected)
            .service(remove_friend),
    );
}
