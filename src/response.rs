//! Response envelope: `data` plus `status`, serialized once per request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// Built fresh per request by the pipeline, filled in by the terminal action,
/// consumed exactly once by `into_response`.
#[derive(Clone, Debug, Serialize)]
pub struct ResponseBody {
    pub data: Value,
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

fn serialize_status<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody {
            data: Value::Null,
            status: StatusCode::OK,
            meta: None,
            error: None,
        }
    }
}

impl ResponseBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn set_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a list payload and its `meta.count`.
    pub fn set_many(mut self, rows: Vec<Value>) -> Self {
        self.meta = Some(MetaCount {
            count: rows.len() as u64,
        });
        self.data = Value::Array(rows);
        self
    }

    pub fn failure(status: StatusCode, error: ErrorDetail) -> Self {
        ResponseBody {
            data: Value::Null,
            status,
            meta: None,
            error: Some(error),
        }
    }
}

impl IntoResponse for ResponseBody {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
