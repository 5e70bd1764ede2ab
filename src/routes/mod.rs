// Route exports
pub mod matching;

use actix_web::web;
use crate::services::ParticipantSource;

pub fn configure_routes<S: ParticipantSource + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matching::configure::<S>),
    );
}
