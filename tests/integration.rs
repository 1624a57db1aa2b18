use mime_stream_parser::{MemoryStream, MimeNode, NodeFactory, Parser, SeekStream, LeafContent};

#[test]
fn raw_headers_round_trip_with_content() {
    let data = b"Subject: hi\r\nContent-Type: text/plain\r\n\r\nhello\r\n".to_vec();
    let mut parser = Parser::new(MemoryStream::new(data.clone()));
    let mut factory = NodeFactory;
    let node = parser.construct_part(&mut factory).unwrap().unwrap();

    let mut reconstructed = Vec::new();
    reconstructed.extend_from_slice(node.raw_headers());
    reconstructed.extend_from_slice(b"\n");
    if let MimeNode::Leaf { content: LeafContent::Buffered(b), .. } = &node {
        reconstructed.extend_from_slice(b);
    } else {
        panic!("expected leaf");
    }
    assert_eq!(reconstructed, data);
}

#[test]
fn persistent_mode_content_matches_stream_slice() {
    let data = b"Content-Type: text/plain\r\n\r\nsome body content\r\n".to_vec();
    let cursor = std::io::Cursor::new(data.clone());
    let seek = SeekStream::new(cursor).unwrap();
    let mut parser = Parser::new(seek);
    parser.set_persist_stream(true);
    let mut factory = NodeFactory;
    let node = parser.construct_part(&mut factory).unwrap().unwrap();

    match node {
        MimeNode::Leaf { content: LeafContent::Persistent(mut sub), .. } => {
            let bytes = mime_stream_parser::read_to_end(&mut sub).unwrap();
            assert_eq!(&bytes, b"some body content");
        }
        _ => panic!("expected persistent leaf content"),
    }
}

#[test]
fn nested_message_rfc822_is_parsed_recursively() {
    let data = b"Content-Type: message/rfc822\r\n\r\nSubject: inner\r\nContent-Type: text/plain\r\n\r\ninner body".to_vec();
    let mut parser = Parser::new(MemoryStream::new(data));
    let mut factory = NodeFactory;
    let node = parser.construct_part(&mut factory).unwrap().unwrap();

    match node {
        MimeNode::Message { body, .. } => {
            assert_eq!(body.content_type(), "text/plain");
        }
        _ => panic!("expected message wrapper"),
    }
}

#[test]
fn offsets_survive_a_preceding_preface() {
    let data = b"Content-Type: multipart/mixed; boundary=B\r\n\r\nintro\r\n--B\r\nX-Id: 1\r\n\r\nbody\r\n--B--\r\n".to_vec();
    let mut parser = Parser::new(MemoryStream::new(data.clone()));
    let mut factory = NodeFactory;
    let node = parser.construct_part(&mut factory).unwrap().unwrap();

    match node {
        MimeNode::Multipart { children, .. } => {
            let h = &children[0].headers()[0];
            let expected_offset = data.windows(4).position(|w| w == b"X-Id").unwrap() as i64;
            assert_eq!(h.offset, expected_offset);
        }
        _ => panic!("expected multipart"),
    }
}
