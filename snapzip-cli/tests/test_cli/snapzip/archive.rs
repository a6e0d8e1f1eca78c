use crate::add_test;
use crate::common::{generate_random_data, Fixture, SAMPLE_TEXT};
use crate::KB;

fn docs_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.write("docs/readme.txt", SAMPLE_TEXT.as_bytes());
    fixture.write("docs/sub/data.bin", &generate_random_data(300 * KB));
    fixture.mkdir("docs/empty");
    fixture
}

// Test packing a directory and unpacking it again
add_test!(pack_unpack_directory, async {
    let mut fixture = docs_fixture();
    let data = generate_random_data(300 * KB);

    let output = fixture.run_snapzip(&["docs"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert_eq!(fixture.list("."), ["docs", "docs.tar.sz"]);

    fixture.remove_dir("docs");

    let output = fixture.run_snapzip(&["docs.tar.sz"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert_eq!(fixture.list("."), ["docs", "docs.tar.sz"]);
    assert_eq!(fixture.list("docs"), ["empty", "readme.txt", "sub"]);
    fixture.assert_files(
        &["docs/readme.txt", "docs/sub/data.bin"],
        &[SAMPLE_TEXT.as_bytes(), &data],
    );
    assert!(fixture.list("docs/empty").is_empty());
});

// Test unpacking next to the source picks a new directory name
add_test!(unpack_beside_existing_directory, async {
    let mut fixture = docs_fixture();

    let output = fixture.run_snapzip(&["-q", "docs"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);

    let output = fixture.run_snapzip(&["-q", "docs.tar.sz"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(fixture.dir_exists("docs(1)"));
    fixture.assert_files(&["docs(1)/readme.txt"], &[SAMPLE_TEXT.as_bytes()]);
});

// Test packing twice never overwrites the first archive
add_test!(pack_twice_keeps_both, async {
    let mut fixture = docs_fixture();

    let output = fixture.run_snapzip(&["-q", "docs"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    let first = fixture.read("docs.tar.sz");

    let output = fixture.run_snapzip(&["-q", "docs"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);

    assert_eq!(fixture.list("."), ["docs", "docs(1).tar.sz", "docs.tar.sz"]);
    assert!(fixture.read("docs.tar.sz") == first);
});

// Test headlines name every step
add_test!(pack_prints_headlines, async {
    let mut fixture = docs_fixture();

    let output = fixture.run_snapzip(&["docs"]).await;
    assert!(output.status.success(), "snapzip failed: {}", output.stderr);
    assert!(output.stderr.contains("docs  >  ./docs.tar\n"));
    assert!(output.stderr.contains("./docs.tar  >  ./docs.tar.sz\n"));
    assert!(output.stderr.contains("files"));
});

#[cfg(unix)]
mod unix {
    use std::os::unix::fs::{symlink, MetadataExt};

    use crate::add_test;
    use crate::common::{Fixture, SAMPLE_TEXT};

    // Test symlinks keep their target string
    add_test!(symlink_round_trip, async {
        let mut fixture = Fixture::new();
        fixture.write("tree/target.txt", SAMPLE_TEXT.as_bytes());
        symlink("target.txt", fixture.root_dir_path().join("tree/link")).unwrap();
        symlink("../nowhere", fixture.root_dir_path().join("tree/dangling")).unwrap();

        let output = fixture.run_snapzip(&["-q", "tree"]).await;
        assert!(output.status.success(), "snapzip failed: {}", output.stderr);
        fixture.remove_dir("tree");

        let output = fixture.run_snapzip(&["-q", "tree.tar.sz"]).await;
        assert!(output.status.success(), "snapzip failed: {}", output.stderr);

        let root = fixture.root_dir_path().join("tree");
        assert_eq!(
            std::fs::read_link(root.join("link")).unwrap(),
            std::path::Path::new("target.txt")
        );
        assert_eq!(
            std::fs::read_link(root.join("dangling")).unwrap(),
            std::path::Path::new("../nowhere")
        );
        fixture.assert_files(&["tree/link"], &[SAMPLE_TEXT.as_bytes()]);
    });

    // Test hardlinked files stay hardlinked
    add_test!(hardlink_round_trip, async {
        let mut fixture = Fixture::new();
        fixture.write("tree/first.txt", SAMPLE_TEXT.as_bytes());
        let root = fixture.root_dir_path().join("tree");
        std::fs::hard_link(root.join("first.txt"), root.join("second.txt")).unwrap();

        let output = fixture.run_snapzip(&["-q", "tree"]).await;
        assert!(output.status.success(), "snapzip failed: {}", output.stderr);
        fixture.remove_dir("tree");

        let output = fixture.run_snapzip(&["-q", "tree.tar.sz"]).await;
        assert!(output.status.success(), "snapzip failed: {}", output.stderr);

        let first = std::fs::metadata(root.join("first.txt")).unwrap();
        let second = std::fs::metadata(root.join("second.txt")).unwrap();
        assert_eq!(first.ino(), second.ino());
        assert_eq!(first.nlink(), 2);
        fixture.assert_files(&["tree/second.txt"], &[SAMPLE_TEXT.as_bytes()]);
    });

    // Test permission bits come back
    add_test!(permissions_round_trip, async {
        use std::os::unix::fs::PermissionsExt;

        let mut fixture = Fixture::new();
        fixture.write("tree/run.sh", b"#!/bin/sh\n");
        let script = fixture.root_dir_path().join("tree/run.sh");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o750)).unwrap();

        let output = fixture.run_snapzip(&["-q", "tree"]).await;
        assert!(output.status.success(), "snapzip failed: {}", output.stderr);
        fixture.remove_dir("tree");

        let output = fixture.run_snapzip(&["-q", "tree.tar.sz"]).await;
        assert!(output.status.success(), "snapzip failed: {}", output.stderr);

        let mode = std::fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    });
}
