use super::models::{
    ArrayValue, CommitRequest, Document, DocumentMask, FieldTransform, MapValue, Precondition,
    Value, ValueType, Write, WriteDocument,
};
use super::FirestoreError;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::{DeserializeOwned, Error};
use serde::ser::Error as SerError;
use serde::Serialize;
use serde_json::map::Map;
use serde_json::Value as SerdeValue;
use std::collections::HashMap;

// Firestore's typed value map <-> plain serde_json::Value

pub(crate) fn convert_fields_to_serde_value(
    fields: HashMap<String, Value>,
) -> Result<SerdeValue, FirestoreError> {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key, convert_value_to_serde_value(value)?);
    }
    Ok(SerdeValue::Object(map))
}

fn convert_value_to_serde_value(value: Value) -> Result<SerdeValue, FirestoreError> {
    Ok(match value.value_type {
        ValueType::StringValue(s) => SerdeValue::String(s),
        ValueType::IntegerValue(s) => {
            let i: i64 = s.parse().map_err(|e| {
                <serde_json::Error as Error>::custom(format!(
                    "Failed to parse integer string '{}': {}",
                    s, e
                ))
            })?;
            SerdeValue::Number(i.into())
        }
        ValueType::DoubleValue(d) => SerdeValue::Number(
            serde_json::Number::from_f64(d).ok_or_else(|| {
                <serde_json::Error as Error>::custom(format!("Invalid f64 value: {}", d))
            })?,
        ),
        ValueType::BooleanValue(b) => SerdeValue::Bool(b),
        ValueType::MapValue(map_value) => convert_fields_to_serde_value(map_value.fields)?,
        ValueType::ArrayValue(array_value) => {
            let values = array_value
                .values
                .into_iter()
                .map(convert_value_to_serde_value)
                .collect::<Result<Vec<_>, _>>()?;
            SerdeValue::Array(values)
        }
        ValueType::NullValue(_) => SerdeValue::Null,
        ValueType::TimestampValue(s) => SerdeValue::String(s),
        ValueType::BytesValue(s) => SerdeValue::String(s),
        ValueType::ReferenceValue(s) => SerdeValue::String(s),
    })
}

pub(crate) fn convert_serializable_to_fields<T: Serialize>(
    value: &T,
) -> Result<HashMap<String, Value>, FirestoreError> {
    let serde_value = serde_json::to_value(value)?;
    if let SerdeValue::Object(map) = serde_value {
        let mut fields = HashMap::new();
        for (k, v) in map {
            fields.insert(k, convert_serde_value_to_firestore_value(v)?);
        }
        Ok(fields)
    } else {
        Err(FirestoreError::SerializationError(SerError::custom(
            "Can only set objects as documents",
        )))
    }
}

fn convert_serde_value_to_firestore_value(value: SerdeValue) -> Result<Value, FirestoreError> {
    let value_type = match value {
        SerdeValue::Null => ValueType::NullValue(()),
        SerdeValue::Bool(b) => ValueType::BooleanValue(b),
        SerdeValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                ValueType::IntegerValue(i.to_string())
            } else if let Some(f) = n.as_f64() {
                ValueType::DoubleValue(f)
            } else {
                return Err(FirestoreError::SerializationError(SerError::custom(
                    format!("Unsupported number type: {}", n),
                )));
            }
        }
        SerdeValue::String(s) => ValueType::StringValue(s),
        SerdeValue::Array(a) => {
            let values = a
                .into_iter()
                .map(convert_serde_value_to_firestore_value)
                .collect::<Result<Vec<_>, _>>()?;
            ValueType::ArrayValue(ArrayValue { values })
        }
        SerdeValue::Object(o) => {
            let mut fields = HashMap::new();
            for (k, v) in o {
                fields.insert(k, convert_serde_value_to_firestore_value(v)?);
            }
            ValueType::MapValue(MapValue { fields })
        }
    };
    Ok(Value { value_type })
}

/// Reference to a single document under the database's documents root.
#[derive(Clone)]
pub struct DocumentReference<'a> {
    pub(crate) client: &'a ClientWithMiddleware,
    pub(crate) root_url: String,
    pub(crate) path: String,
}

impl<'a> DocumentReference<'a> {
    fn url(&self) -> String {
        format!("{}/{}", self.root_url, self.path)
    }

    // "projects/{p}/databases/(default)/documents/users/u1", regardless of host.
    fn resource_name(&self) -> String {
        let base = self
            .root_url
            .find("/projects/")
            .map(|i| &self.root_url[i + 1..])
            .unwrap_or(&self.root_url);
        format!("{}/{}", base, self.path)
    }

    /// Fetches the document and decodes its fields into `T`.
    ///
    /// An absent document is `Ok(None)`, never an error.
    pub async fn get<T: DeserializeOwned>(&self) -> Result<Option<T>, FirestoreError> {
        let response = self.client.get(self.url()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FirestoreError::ApiError(format!(
                "Get document failed {}: {}",
                status, text
            )));
        }

        let doc: Document = response.json().await?;
        let serde_value = convert_fields_to_serde_value(doc.fields)?;
        let obj = serde_json::from_value(serde_value)?;
        Ok(Some(obj))
    }

    /// Updates the masked fields of the document.
    ///
    /// Fields named in the mask but absent from `value` are deleted.
    pub async fn update<T: Serialize>(
        &self,
        value: &T,
        update_mask: Vec<String>,
    ) -> Result<(), FirestoreError> {
        let fields = convert_serializable_to_fields(value)?;

        let params: Vec<(&str, &str)> = update_mask
            .iter()
            .map(|f| ("updateMask.fieldPaths", f.as_str()))
            .collect();

        let body = serde_json::to_vec(&serde_json::json!({ "fields": fields }))?;

        let response = self
            .client
            .patch(self.url())
            .query(&params)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FirestoreError::ApiError(format!(
                "Update document failed {}: {}",
                status, text
            )));
        }

        Ok(())
    }

    /// Removes a single field from the document, leaving the rest untouched.
    pub async fn delete_field(&self, field: &str) -> Result<(), FirestoreError> {
        self.update(&serde_json::json!({}), vec![field.to_string()])
            .await
    }

    /// Updates the fields of `value` and sets each of `timestamp_fields` to the
    /// server's request time, as a single commit against an existing document.
    pub async fn update_with_server_timestamps<T: Serialize>(
        &self,
        value: &T,
        timestamp_fields: &[&str],
    ) -> Result<(), FirestoreError> {
        let fields = convert_serializable_to_fields(value)?;

        let mut field_paths: Vec<String> = fields.keys().cloned().collect();
        field_paths.sort();

        let transforms = timestamp_fields
            .iter()
            .map(|f| FieldTransform {
                field_path: (*f).to_string(),
                set_to_server_value: "REQUEST_TIME".to_string(),
            })
            .collect();

        let request = CommitRequest {
            writes: vec![Write {
                update: WriteDocument {
                    name: self.resource_name(),
                    fields,
                },
                update_mask: Some(DocumentMask { field_paths }),
                update_transforms: Some(transforms),
                current_document: Some(Precondition { exists: Some(true) }),
            }],
        };

        let url = format!("{}:commit", self.root_url);

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FirestoreError::ApiError(format!(
                "Commit failed {}: {}",
                status, text
            )));
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct CollectionReference<'a> {
    pub(crate) client: &'a ClientWithMiddleware,
    pub(crate) root_url: String,
    pub(crate) collection_id: String,
}

impl<'a> CollectionReference<'a> {
    pub fn doc(&self, document_id: &str) -> DocumentReference<'a> {
        DocumentReference {
            client: self.client,
            root_url: self.root_url.clone(),
            path: format!("{}/{}", self.collection_id, document_id),
        }
    }
}
