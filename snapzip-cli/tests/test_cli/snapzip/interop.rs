use std::fs::File;
use std::io::{BufReader, BufWriter};

use snapzip_core::{pipeline, Silent};

use crate::add_test;
use crate::common::{generate_random_data, Fixture, SAMPLE_TEXT};
use crate::KB;

/// Decompresses `from` to `to` without extracting anything.
fn decompress_only(fixture: &Fixture, from: &str, to: &str) {
    let input = File::open(fixture.root_dir_path().join(from)).unwrap();
    let expected = input.metadata().unwrap().len();
    let output = File::create(fixture.root_dir_path().join(to)).unwrap();
    pipeline::decompress(
        BufReader::new(input),
        BufWriter::new(output),
        expected,
        &mut Silent,
    )
    .unwrap();
}

// Our archive -> system tar -t / -x.
add_test!(our_archive_to_system_tar, async {
    let data = generate_random_data(200 * KB);
    let mut fixture = Fixture::new();
    fixture.write("docs/readme.txt", SAMPLE_TEXT.as_bytes());
    fixture.write("docs/sub/data.bin", &data);

    let output = fixture.run_snapzip(&["-q", "docs"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    decompress_only(&fixture, "docs.tar.sz", "docs.tar");

    let Some(listing) = fixture.run_system("tar", &["-tf", "docs.tar"]).await else {
        return;
    };
    assert!(listing.status.success(), "system tar -t failed: {}", listing.stderr);
    let names: Vec<&str> = listing.stdout.lines().collect();
    assert_eq!(
        names,
        ["docs/", "docs/readme.txt", "docs/sub/", "docs/sub/data.bin"]
    );

    fixture.mkdir("out");
    let Some(extracted) = fixture
        .run_system("tar", &["-xf", "docs.tar", "-C", "out"])
        .await
    else {
        return;
    };
    assert!(
        extracted.status.success(),
        "system tar -x failed: {}",
        extracted.stderr
    );
    fixture.assert_files(
        &["out/docs/readme.txt", "out/docs/sub/data.bin"],
        &[SAMPLE_TEXT.as_bytes(), &data],
    );
});

// System tar -c -> our compressor -> our extractor.
add_test!(system_tar_to_our_extractor, async {
    let data = generate_random_data(200 * KB);
    let mut fixture = Fixture::new();
    fixture.write("photos/a.jpg", &data);
    fixture.write("photos/notes/b.txt", SAMPLE_TEXT.as_bytes());

    let Some(created) = fixture
        .run_system("tar", &["-cf", "photos.tar", "photos"])
        .await
    else {
        return;
    };
    assert!(created.status.success(), "system tar -c failed: {}", created.stderr);
    fixture.remove_dir("photos");

    // A plain file as far as snapzip is concerned
    let output = fixture.run_snapzip(&["-q", "photos.tar"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(fixture.file_exists("photos.tar.sz"));

    let output = fixture.run_snapzip(&["-q", "photos.tar.sz"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    fixture.assert_files(
        &["photos/a.jpg", "photos/notes/b.txt"],
        &[&data, SAMPLE_TEXT.as_bytes()],
    );
});
