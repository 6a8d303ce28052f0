use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use byteorder::{LittleEndian, WriteBytesExt};

use crate::app_state::AppState;
use crate::interpol::ContactMap;

/// 触点坐标编码为小端 f64 三元组，行优先
pub fn encode_contacts(contacts: &ContactMap) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(contacts.len() * 3 * std::mem::size_of::<f64>());
    for position in contacts.positions() {
        for value in position.to_array() {
            bytes.write_f64::<LittleEndian>(value)?;
        }
    }
    Ok(bytes)
}

#[get("/jobs/{job_id}/contacts")]
pub async fn get_job_contacts(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let job_id = path.into_inner();
    let Some(job) = data.job_store.get(&job_id) else {
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": "无效或已过期的 job_id",
            "job_id": job_id,
        }));
    };

    let bytes = match encode_contacts(&job.contacts) {
        Ok(bytes) => bytes,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "写入触点数据失败",
                "details": e.to_string(),
            }));
        }
    };

    let shape = job.contacts.shape();
    HttpResponse::Ok()
        .content_type(ContentType::octet_stream())
        .append_header(("X-Contact-Rows", shape.rows.to_string()))
        .append_header(("X-Contact-Cols", shape.cols.to_string()))
        .append_header(("X-Contact-Count", job.contacts.len().to_string()))
        .append_header(("X-Job-Id", job_id))
        .body(bytes)
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;
    use crate::geometry::Point3D;
    use crate::interpol::interpolate_corners;

    #[test]
    fn encodes_row_major_triples() {
        let contacts = interpolate_corners(
            Point3D::new(1.0, 2.0, 3.0),
            Point3D::new(1.0, 2.0, 9.0),
            None,
            1,
            3,
        )
        .unwrap();
        let bytes = encode_contacts(&contacts).unwrap();

        assert_eq!(bytes.len(), 3 * 3 * 8);
        let mut values = vec![0.0; 9];
        LittleEndian::read_f64_into(&bytes, &mut values);
        assert_eq!(values, vec![1.0, 2.0, 3.0, 1.0, 2.0, 6.0, 1.0, 2.0, 9.0]);
    }
}
