//! Minimal `multipart/form-data` body builder.
//!
//! ureq v3 does not bundle multipart support, so forms are assembled by
//! hand. Only file parts are supported.

use crate::model::UploadedFile;

/// A form body under construction.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    /// Start a form with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("nerlens-{:016x}", rand::random::<u64>()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        MultipartForm {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    /// Append a file part carrying the upload's name, content type and bytes.
    pub fn file(mut self, field: &str, file: &UploadedFile) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary,
                escape_quoted(field),
                escape_quoted(&file.name),
                file.content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(&file.bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Close the form. Returns the `Content-Type` header value and the body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let content_type = format!("multipart/form-data; boundary={}", self.boundary);
        (content_type, self.body)
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-encode the characters that would break a quoted header
/// parameter, the same way browsers encode form filenames.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_part_layout() {
        let file = UploadedFile::new("notes.txt", Some("text/plain"), b"Paris is big".to_vec());
        let (content_type, body) = MultipartForm::with_boundary("XYZ").file("file", &file).finish();

        assert_eq!(content_type, "multipart/form-data; boundary=XYZ");
        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            Paris is big\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn binary_bytes_are_copied_verbatim() {
        let bytes = vec![0u8, 159, 146, 150, b'\r', b'\n'];
        let file = UploadedFile::new("blob.txt", None, bytes.clone());
        let (_, body) = MultipartForm::with_boundary("b").file("file", &file).finish();
        assert!(body.windows(bytes.len()).any(|w| w == bytes.as_slice()));
    }

    #[test]
    fn quotes_in_filenames_are_encoded() {
        let file = UploadedFile::new("a\"b\r\n.txt", Some("text/plain"), vec![]);
        let (_, body) = MultipartForm::with_boundary("b").file("file", &file).finish();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("filename=\"a%22b%0D%0A.txt\""));
    }

    #[test]
    fn random_boundary_frames_the_body() {
        let file = UploadedFile::new("notes.txt", Some("text/plain"), b"{}".to_vec());
        let (content_type, body) = MultipartForm::new().file("file", &file).finish();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        assert!(boundary.starts_with("nerlens-"));
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{}\r\n", boundary)));
        assert!(text.contains("\r\n\r\n{}\r\n"));
        assert!(text.ends_with(&format!("--{}--\r\n", boundary)));
    }
}
