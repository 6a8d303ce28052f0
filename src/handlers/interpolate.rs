use actix_web::{HttpResponse, Responder, post, web};
use serde::Deserialize;

use crate::geometry::{ArrayShape, Point3D};
use crate::handlers::error_response;
use crate::interpol::{AnchorSet, interpolate};

#[derive(Deserialize)]
pub struct InterpolateRequest {
    /// "MxN"，例如 "8x8"
    pub grid_config: String,
    #[serde(rename = "A")]
    pub a: Point3D,
    #[serde(rename = "B")]
    pub b: Point3D,
    #[serde(rename = "C", default)]
    pub c: Option<Point3D>,
}

/// 直接根据角点插值，不涉及任何文件
#[post("/interpolate")]
pub async fn interpolate_array(payload: web::Json<InterpolateRequest>) -> impl Responder {
    let result = payload
        .grid_config
        .parse::<ArrayShape>()
        .and_then(|shape| {
            let anchors = AnchorSet {
                a: payload.a,
                b: payload.b,
                c: payload.c,
            };
            interpolate(&anchors, shape)
        });

    match result {
        Ok(contacts) => HttpResponse::Ok().json(contacts),
        Err(e) => error_response(&e),
    }
}
