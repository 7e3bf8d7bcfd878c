use com::{ComError, MultipartParser, multipart::MAX_PART_SIZE};

fn part_with_length(boundary: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "--{boundary}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        payload.len()
    )
    .into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\r\n");
    out
}

fn part_without_length(boundary: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = format!("--{boundary}\r\nContent-Type: image/jpeg\r\n\r\n").into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\r\n");
    out
}

fn drain(parser: &mut MultipartParser) -> Vec<Vec<u8>> {
    let mut parts = Vec::new();
    while let Some(part) = parser.next_part().unwrap() {
        parts.push(part);
    }
    parts
}

#[test]
fn test_parts_with_content_length() {
    let mut parser = MultipartParser::new(Some("frame"));
    parser.push(&part_with_length("frame", b"\xFF\xD8first\xFF\xD9"));
    parser.push(&part_with_length("frame", b"\xFF\xD8second\xFF\xD9"));

    let parts = drain(&mut parser);
    assert_eq!(parts, vec![b"\xFF\xD8first\xFF\xD9".to_vec(), b"\xFF\xD8second\xFF\xD9".to_vec()]);
    assert!(parser.is_between_parts());
}

#[test]
fn test_content_length_payload_may_contain_marker_text() {
    let payload = b"abc--frame\r\nxyz";
    let mut parser = MultipartParser::new(Some("frame"));
    parser.push(&part_with_length("frame", payload));
    assert_eq!(parser.next_part().unwrap().unwrap(), payload.to_vec());
}

#[test]
fn test_parts_delimited_by_next_boundary() {
    let mut parser = MultipartParser::new(Some("frame"));
    parser.push(&part_without_length("frame", b"one"));
    parser.push(&part_without_length("frame", b"two"));

    // the second part is only complete once a third boundary arrives
    assert_eq!(drain(&mut parser), vec![b"one".to_vec()]);
    parser.push(b"--frame\r\n");
    assert_eq!(drain(&mut parser), vec![b"two".to_vec()]);
}

#[test]
fn test_byte_at_a_time_delivery() {
    let mut stream = part_with_length("b", b"payload-1");
    stream.extend(part_without_length("b", b"payload-2"));
    stream.extend_from_slice(b"--b--\r\n");

    let mut parser = MultipartParser::new(Some("b"));
    let mut parts = Vec::new();
    for byte in stream {
        parser.push(&[byte]);
        parts.extend(drain(&mut parser));
    }
    assert_eq!(parts, vec![b"payload-1".to_vec(), b"payload-2".to_vec()]);
    assert!(parser.is_finished());
}

#[test]
fn test_boundary_learned_from_body() {
    let mut parser = MultipartParser::new(None);
    parser.push(b"\r\n");
    parser.push(&part_with_length("ipcamera", b"jpeg"));
    assert_eq!(parser.next_part().unwrap().unwrap(), b"jpeg".to_vec());
    assert_eq!(parser.boundary(), Some(&b"ipcamera"[..]));
}

#[test]
fn test_body_not_starting_with_boundary_is_framing_error() {
    let mut parser = MultipartParser::new(None);
    parser.push(b"\xFF\xD8 raw jpeg without multipart\n");
    assert!(matches!(parser.next_part(), Err(ComError::Framing(_))));
}

#[test]
fn test_missing_marker_is_framing_error() {
    let mut parser = MultipartParser::new(Some("frame"));
    let filler = vec![b'x'; 4096];
    let mut result = Ok(None);
    for _ in 0..4 {
        parser.push(&filler);
        result = parser.next_part();
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(result, Err(ComError::Framing(_))));
}

#[test]
fn test_oversized_content_length() {
    let mut parser = MultipartParser::new(Some("frame"));
    parser.push(format!("--frame\r\nContent-Length: {}\r\n\r\n", MAX_PART_SIZE + 1).as_bytes());
    assert!(matches!(parser.next_part(), Err(ComError::PartTooLarge(_))));
}

#[test]
fn test_invalid_content_length() {
    let mut parser = MultipartParser::new(Some("frame"));
    parser.push(b"--frame\r\nContent-Length: twelve\r\n\r\n");
    assert!(matches!(parser.next_part(), Err(ComError::Framing(_))));
}

#[test]
fn test_finish_flushes_delimited_tail() {
    let mut parser = MultipartParser::new(Some("frame"));
    parser.push(&part_without_length("frame", b"last"));
    assert_eq!(parser.next_part().unwrap(), None);
    assert!(!parser.is_between_parts());
    assert_eq!(parser.finish(), Some(b"last".to_vec()));
    assert!(parser.is_finished());
}

#[test]
fn test_finish_drops_incomplete_sized_part() {
    let mut parser = MultipartParser::new(Some("frame"));
    parser.push(b"--frame\r\nContent-Length: 100\r\n\r\nshort");
    assert_eq!(parser.next_part().unwrap(), None);
    assert_eq!(parser.finish(), None);
}
