pub mod client;
pub mod completion;
pub mod types;

pub use completion::GeminiCompletionClient;

/// Adds a test-only `with_base_url` to a client wrapping a `GeminiHttpClient` in `http`.
#[cfg(test)]
macro_rules! impl_with_gemini_base_url {
    ($client:ty) => {
        impl $client {
            pub(crate) fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}

#[cfg(test)]
pub(crate) use impl_with_gemini_base_url;

#[cfg(test)]
pub(crate) mod test_support {
    use wiremock::matchers::{method, path_regex};
    use wiremock::MockBuilder;

    pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

    pub fn post_path_regex(regex: &str) -> MockBuilder {
        wiremock::Mock::given(method("POST")).and(path_regex(regex))
    }
}
