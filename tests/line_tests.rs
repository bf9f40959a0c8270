//! LineReader tests – framing, CRLF and the length cap

#[cfg(test)]
mod tests {
    use craft_agent::line::LineReader;

    fn read_all(input: &[u8], max: usize) -> Vec<String> {
        tokio_test::block_on(async {
            let mut reader = LineReader::new(input).max_line_len(max);
            let mut lines = Vec::new();
            while let Some(line) = reader.next_line().await.unwrap() {
                lines.push(line);
            }
            lines
        })
    }

    #[test]
    fn splits_on_newline_and_strips_crlf() {
        let lines = read_all(b"one\r\ntwo\n\nthree", 1024);
        assert_eq!(lines, vec!["one", "two", "", "three"]);
    }

    #[test]
    fn empty_input_is_eof() {
        assert!(read_all(b"", 1024).is_empty());
    }

    #[test]
    fn oversized_line_is_skipped_and_reading_resumes() {
        let mut input = vec![b'x'; 100];
        input.extend_from_slice(b"\nshort\n");

        let lines = read_all(&input, 16);

        assert_eq!(lines, vec!["short"]);
    }

    #[test]
    fn oversized_trailing_line_without_newline_is_dropped() {
        let mut input = b"ok\n".to_vec();
        input.extend(std::iter::repeat(b'y').take(100));

        let lines = read_all(&input, 16);

        assert_eq!(lines, vec!["ok"]);
    }

    #[test]
    fn line_at_the_cap_is_kept() {
        let lines = read_all(b"0123456789abcdef\n", 16);
        assert_eq!(lines, vec!["0123456789abcdef"]);
    }
}
