use crate::add_test;
use crate::common::{Fixture, SAMPLE_TEXT, STREAM_IDENTIFIER};

// Test an empty file compresses to the bare stream identifier
add_test!(empty_file, async {
    const FILE_NAME: &str = "empty";

    let mut fixture = Fixture::with_file(FILE_NAME, b"");

    let output = fixture.run_snapzip(&[FILE_NAME]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(fixture.read("empty.sz") == STREAM_IDENTIFIER);

    let output = fixture.run_snapzip(&["empty.sz"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(fixture.read("empty(1)").is_empty());
});

// Test an empty directory still packs
add_test!(empty_directory, async {
    let mut fixture = Fixture::new();
    fixture.mkdir("hollow");

    let output = fixture.run_snapzip(&["-q", "hollow"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    fixture.remove_dir("hollow");

    let output = fixture.run_snapzip(&["-q", "hollow.tar.sz"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(fixture.dir_exists("hollow"));
    assert!(fixture.list("hollow").is_empty());
});

// Test a missing input reports program and file name
add_test!(missing_input, async {
    let mut fixture = Fixture::new();

    let output = fixture.run_snapzip(&["missing.txt"]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("snapzip: missing.txt: "));
});

// Test one failing input does not stop the others
add_test!(failure_does_not_stop_siblings, async {
    let mut fixture = Fixture::with_files(
        &["a.txt", "b.txt"],
        &[SAMPLE_TEXT.as_bytes(), b"second file"],
    );

    let output = fixture
        .run_snapzip(&["a.txt", "missing.txt", "b.txt"])
        .await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("snapzip: missing.txt: "));
    assert!(fixture.file_exists("a.txt.sz"));
    assert!(fixture.file_exists("b.txt.sz"));
});

// Test several inputs suppress progress lines
add_test!(multiple_inputs_hide_progress, async {
    let mut fixture = Fixture::with_files(
        &["a.txt", "b.txt"],
        &[SAMPLE_TEXT.as_bytes(), b"second file"],
    );

    let output = fixture.run_snapzip(&["a.txt", "b.txt"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(!output.stderr.contains('%'));
    assert!(output.stderr.contains("a.txt  >  ./a.txt.sz"));
    assert!(output.stderr.contains("b.txt  >  ./b.txt.sz"));
});

// Test quiet mode prints nothing on success and errors at the end
add_test!(quiet_mode, async {
    let mut fixture = Fixture::with_file("a.txt", SAMPLE_TEXT.as_bytes());

    let output = fixture.run_snapzip(&["-q", "a.txt"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(output.stderr.is_empty());

    let output = fixture.run_snapzip(&["-q", "missing.txt", "a.txt"]).await;
    assert!(!output.status.success());
    assert_eq!(output.stderr.lines().count(), 1);
    assert!(output.stderr.starts_with("snapzip: missing.txt: "));
    assert!(fixture.file_exists("a.txt(1).sz"));
});

// Test an output directory that does not exist is rejected
add_test!(invalid_output_directory, async {
    let mut fixture = Fixture::with_file("a.txt", SAMPLE_TEXT.as_bytes());

    let output = fixture.run_snapzip(&["-C", "nope", "a.txt"]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("nope: Not a directory"));
    assert!(!fixture.file_exists("a.txt.sz"));
});

// Test running without inputs is a usage error
add_test!(no_inputs, async {
    let mut fixture = Fixture::new();

    let output = fixture.run_snapzip(&[]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("Usage"));
});

// Test a corrupt stream fails and leaves nothing behind
add_test!(corrupt_stream, async {
    let mut data = STREAM_IDENTIFIER.to_vec();
    data.extend_from_slice(&[0x01, 0x0a, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef]);
    data.extend_from_slice(b"garbage!");
    let mut fixture = Fixture::with_file("broken.sz", &data);

    let output = fixture.run_snapzip(&["broken.sz"]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("snapzip: broken.sz: "));
    assert_eq!(fixture.list("."), ["broken.sz"]);
});

// Test compressed content is recognized without the .sz suffix
add_test!(decompress_without_suffix, async {
    let mut fixture = Fixture::with_file("notes.txt", SAMPLE_TEXT.as_bytes());

    let output = fixture.run_snapzip(&["-q", "notes.txt"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    fixture.remove_file("notes.txt");
    std::fs::rename(
        fixture.root_dir_path().join("notes.txt.sz"),
        fixture.root_dir_path().join("packed.bin"),
    )
    .unwrap();

    let output = fixture.run_snapzip(&["-q", "packed.bin"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    fixture.assert_files(&["packed(1).bin"], &[SAMPLE_TEXT.as_bytes()]);
});
