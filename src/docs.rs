use utoipa::OpenApi;
use crate::modules::processing::dto::{PushMessage, PushRequest};
use crate::modules::processing::model::ProcessedVideo;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::processing::handler::process_video,
        crate::modules::processing::handler::health,
    ),
    components(
        schemas(PushRequest, PushMessage, ProcessedVideo)
    ),
    tags(
        (name = "Processing", description = "Raw video transcoding pipeline")
    )
)]
pub struct ApiDoc;
