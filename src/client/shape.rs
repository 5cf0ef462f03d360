//! Response shape normalization.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{_prelude::*, error::ResponseError, http::ApiResponse};

/// Predicate deciding whether a body's code field denotes success.
pub type CodePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
/// Extractor producing the payload from a decoded body.
pub type DataExtractor = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// What a successful call hands back to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseReturn {
	/// The full response, untouched.
	#[default]
	Raw,
	/// The decoded body.
	Body,
	/// The payload extracted from a body whose code field denotes success.
	Data,
}

/// Success rule applied to the body's code field.
#[derive(Clone)]
pub enum SuccessRule {
	/// The code must equal this value.
	Code(Value),
	/// The code must satisfy this predicate.
	Predicate(CodePredicate),
}
impl SuccessRule {
	fn accepts(&self, code: &Value) -> bool {
		match self {
			Self::Code(expected) => code == expected,
			Self::Predicate(predicate) => predicate(code),
		}
	}
}
impl Debug for SuccessRule {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Code(code) => f.debug_tuple("Code").field(code).finish(),
			Self::Predicate(_) => f.write_str("Predicate(..)"),
		}
	}
}

/// Payload location inside the body.
#[derive(Clone)]
pub enum DataRule {
	/// Top-level field holding the payload.
	Field(String),
	/// Custom extractor over the whole body.
	Extract(DataExtractor),
}
impl DataRule {
	fn extract(&self, body: &Value) -> Value {
		match self {
			Self::Field(field) => body.get(field).cloned().unwrap_or(Value::Null),
			Self::Extract(extractor) => extractor(body),
		}
	}
}
impl Debug for DataRule {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Field(field) => f.debug_tuple("Field").field(field).finish(),
			Self::Extract(_) => f.write_str("Extract(..)"),
		}
	}
}

/// Envelope convention of the backend: `{ "<code_field>": .., "<data_field>": .. }`.
#[derive(Clone, Debug)]
pub struct ResponseShape {
	/// Field holding the result code.
	pub code_field: String,
	/// Payload location.
	pub data: DataRule,
	/// Success rule for the code.
	pub success: SuccessRule,
}
impl ResponseShape {
	/// Overrides the code field name.
	pub fn code_field(mut self, field: impl Into<String>) -> Self {
		self.code_field = field.into();

		self
	}

	/// Overrides the payload field name.
	pub fn data_field(mut self, field: impl Into<String>) -> Self {
		self.data = DataRule::Field(field.into());

		self
	}

	/// Extracts the payload with a custom function.
	pub fn data_with<F>(mut self, extractor: F) -> Self
	where
		F: 'static + Fn(&Value) -> Value + Send + Sync,
	{
		self.data = DataRule::Extract(Arc::new(extractor));

		self
	}

	/// Requires the code to equal `code`.
	pub fn success_code(mut self, code: impl Into<Value>) -> Self {
		self.success = SuccessRule::Code(code.into());

		self
	}

	/// Requires the code to satisfy `predicate`.
	pub fn success_when<F>(mut self, predicate: F) -> Self
	where
		F: 'static + Fn(&Value) -> bool + Send + Sync,
	{
		self.success = SuccessRule::Predicate(Arc::new(predicate));

		self
	}

	/// Applies the shape to a response.
	///
	/// Responses outside the 2xx range always fail. Otherwise `Raw` returns the response,
	/// `Body` returns the decoded body (or its text when it is not JSON), and `Data` returns the
	/// extracted payload when the code passes the success rule.
	pub fn normalize(
		&self,
		response: ApiResponse,
		mode: ResponseReturn,
	) -> Result<ApiPayload, ResponseError> {
		if !response.is_success() {
			return Err(ResponseError::new(response));
		}

		match mode {
			ResponseReturn::Raw => Ok(ApiPayload::Raw(response)),
			ResponseReturn::Body => {
				let body = response.json().unwrap_or_else(|_| Value::String(response.text()));

				Ok(ApiPayload::Body(body))
			},
			ResponseReturn::Data => {
				let Ok(body) = response.json() else {
					return Err(ResponseError::new(response));
				};
				let code = body.get(&self.code_field).unwrap_or(&Value::Null);

				if self.success.accepts(code) {
					Ok(ApiPayload::Data(self.data.extract(&body)))
				} else {
					Err(ResponseError::new(response))
				}
			},
		}
	}
}
impl Default for ResponseShape {
	fn default() -> Self {
		Self {
			code_field: "code".into(),
			data: DataRule::Field("data".into()),
			success: SuccessRule::Code(Value::from(0)),
		}
	}
}

/// Successful call outcome, shaped per [`ResponseReturn`].
#[derive(Clone, Debug)]
pub enum ApiPayload {
	/// Unmodified response.
	Raw(ApiResponse),
	/// Decoded body.
	Body(Value),
	/// Extracted payload.
	Data(Value),
}
impl ApiPayload {
	/// JSON view of the payload; raw responses are decoded on demand.
	pub fn into_json(self) -> Result<Value> {
		self.decode()
	}

	/// Decodes the payload into `T`, reporting the failing path on mismatch.
	pub fn decode<T>(self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		match self {
			Self::Raw(response) => {
				let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

				Ok(serde_path_to_error::deserialize(&mut deserializer)?)
			},
			Self::Body(value) | Self::Data(value) => Ok(serde_path_to_error::deserialize(value)?),
		}
	}
}
