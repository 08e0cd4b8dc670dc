/// A file part pulled out of a multipart/form-data body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    /// As sent by the client; may be empty when the browser had no file selected.
    pub filename: String,
    pub data: Vec<u8>,
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';').map(|s| s.trim());
    let mime = params.next()?;
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params
        .find_map(|s| {
            let (key, value) = s.split_once('=')?;
            key.trim().eq_ignore_ascii_case("boundary").then(|| value.trim().trim_matches('"').to_owned())
        })
        .filter(|b| !b.is_empty())
}

/// Finds the part whose form field is `field_name` and that carries a
/// `filename` parameter (i.e. came from a file input).
pub fn find_file_part(body: &[u8], boundary: &str, field_name: &str) -> Option<FilePart> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";

    for part in split_on(body, delimiter.as_bytes()) {
        let Some(sep_pos) = find_subsequence(part, sep) else {
            continue;
        };
        let headers = String::from_utf8_lossy(&part[..sep_pos]);
        let Some(disposition) = parse_disposition(&headers) else {
            continue;
        };
        if disposition.name.as_deref() != Some(field_name) {
            continue;
        }
        if let Some(filename) = disposition.filename {
            let raw = &part[sep_pos + sep.len()..];
            let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);
            return Some(FilePart { filename, data: data.to_vec() });
        }
    }
    None
}

#[derive(Debug, Default, PartialEq)]
struct Disposition {
    name: Option<String>,
    filename: Option<String>,
}

/// Parses the `Content-Disposition` header of one part.
fn parse_disposition(headers: &str) -> Option<Disposition> {
    let line = headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case("content-disposition").then_some(value)
    })?;

    let mut disposition = Disposition::default();
    for (key, value) in split_params(line) {
        match key.to_ascii_lowercase().as_str() {
            "name" => disposition.name = Some(value),
            "filename" => disposition.filename = Some(value),
            _ => {}
        }
    }
    Some(disposition)
}

/// Splits `form-data; name="a"; filename="b;c.png"` into key/value pairs,
/// honoring quotes so separators inside quoted values are kept.
fn split_params(line: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
        .iter()
        .filter_map(|seg| {
            let (key, value) = seg.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((key.trim().to_owned(), value.to_owned()))
        })
        .collect()
}
