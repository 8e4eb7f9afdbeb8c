use tea_os::{
    dir_make,
    file::{properties_from_path, File},
    AccessFlags, OsError, Str8,
};

mod test_common;
use crate::test_common::ScratchDir;

fn span(path: &str) -> Str8<'_> {
    Str8::from(path)
}

mod open {
    use super::*;

    #[test]
    fn missing_file_for_read_is_not_found() {
        let scratch = ScratchDir::new("open-missing");
        let path = scratch.join("missing.txt");
        let err = File::open(span(&path), AccessFlags::READ).unwrap_err();
        assert_eq!(err, OsError::NotFound);
    }

    #[test]
    fn missing_parent_is_not_found() {
        let scratch = ScratchDir::new("open-parent");
        let path = scratch.join("nope/file.txt");
        let err = File::open(span(&path), AccessFlags::WRITE).unwrap_err();
        assert_eq!(err, OsError::NotFound);
    }

    #[test]
    fn write_creates_file() {
        let scratch = ScratchDir::new("open-create");
        let path = scratch.join("new.txt");
        let file = File::open(span(&path), AccessFlags::WRITE).unwrap();
        assert_eq!(file.write(0, b"hello").unwrap(), 5);
        file.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn write_only_truncates() {
        let scratch = ScratchDir::new("open-truncate");
        let path = scratch.join("old.txt");
        std::fs::write(&path, b"previous contents").unwrap();

        let file = File::open(span(&path), AccessFlags::WRITE).unwrap();
        file.write(0, b"new").unwrap();
        drop(file);
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn read_write_keeps_contents() {
        let scratch = ScratchDir::new("open-keep");
        let path = scratch.join("keep.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let file = File::open(span(&path), AccessFlags::READ | AccessFlags::WRITE).unwrap();
        file.write(2, b"ab").unwrap();
        drop(file);
        assert_eq!(std::fs::read(&path).unwrap(), b"01ab456789");
    }

    #[test]
    fn shared_readers() {
        let scratch = ScratchDir::new("open-shared");
        let path = scratch.join("shared.txt");
        std::fs::write(&path, b"shared").unwrap();

        let flags = AccessFlags::READ | AccessFlags::SHARE_READ;
        let first = File::open(span(&path), flags).unwrap();
        let second = File::open(span(&path), flags).unwrap();

        let mut out = [0u8; 6];
        assert_eq!(first.read(0..6, &mut out).unwrap(), 6);
        assert_eq!(second.read(0..6, &mut out).unwrap(), 6);
        assert_eq!(&out, b"shared");
    }
}

mod ranges {
    use super::*;

    #[test]
    fn explicit_offsets_in_any_order() {
        let scratch = ScratchDir::new("ranges");
        let path = scratch.join("ranges.bin");
        let file = File::open(span(&path), AccessFlags::READ | AccessFlags::WRITE).unwrap();

        // write the tail first, the gap before it reads back as zeroes
        assert_eq!(file.write(10, b"BB").unwrap(), 2);
        assert_eq!(file.write(0, b"AA").unwrap(), 2);
        assert_eq!(file.properties().unwrap().size, 12);

        let mut out = [0u8; 2];
        assert_eq!(file.read(10..12, &mut out).unwrap(), 2);
        assert_eq!(&out, b"BB");
        assert_eq!(file.read(0..2, &mut out).unwrap(), 2);
        assert_eq!(&out, b"AA");

        let mut gap = [0xFFu8; 8];
        assert_eq!(file.read(2..10, &mut gap).unwrap(), 8);
        assert_eq!(gap, [0u8; 8]);
    }

    #[test]
    fn short_read_at_end_of_file() {
        let scratch = ScratchDir::new("short-read");
        let path = scratch.join("short.txt");
        std::fs::write(&path, b"abcdef").unwrap();

        let file = File::open(span(&path), AccessFlags::READ).unwrap();
        let mut out = [0u8; 16];
        assert_eq!(file.read(4..20, &mut out).unwrap(), 2);
        assert_eq!(&out[..2], b"ef");
        assert_eq!(file.read(100..116, &mut out).unwrap(), 0);
    }

    #[test]
    fn empty_range() {
        let scratch = ScratchDir::new("empty-range");
        let path = scratch.join("empty.txt");
        std::fs::write(&path, b"abc").unwrap();

        let file = File::open(span(&path), AccessFlags::READ).unwrap();
        let mut out: [u8; 0] = [];
        assert_eq!(file.read(1..1, &mut out).unwrap(), 0);
    }

    #[test]
    fn buffer_smaller_than_range() {
        let scratch = ScratchDir::new("small-buffer");
        let path = scratch.join("small.txt");
        std::fs::write(&path, b"abcdef").unwrap();

        let file = File::open(span(&path), AccessFlags::READ).unwrap();
        let mut out = [0u8; 2];
        assert_eq!(file.read(0..4, &mut out).unwrap_err(), OsError::InvalidArgument);
    }

    #[test]
    fn inverted_range() {
        let scratch = ScratchDir::new("inverted-range");
        let path = scratch.join("inverted.txt");
        std::fs::write(&path, b"abcdef").unwrap();

        let file = File::open(span(&path), AccessFlags::READ).unwrap();
        let mut out = [0u8; 4];
        #[allow(clippy::reversed_empty_ranges)]
        let err = file.read(4..2, &mut out).unwrap_err();
        assert_eq!(err, OsError::InvalidArgument);
    }
}

mod append {
    use super::*;

    #[test]
    fn writes_land_in_call_order() {
        let scratch = ScratchDir::new("append");
        let path = scratch.join("log.txt");
        std::fs::write(&path, b"start;").unwrap();

        let file = File::open(span(&path), AccessFlags::WRITE | AccessFlags::APPEND).unwrap();
        assert_eq!(file.write(0, b"first;").unwrap(), 6);
        assert_eq!(file.write(2, b"second;").unwrap(), 7);
        file.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"start;first;second;");
    }

    #[test]
    fn append_creates_missing_file() {
        let scratch = ScratchDir::new("append-create");
        let path = scratch.join("fresh.txt");

        let file = File::open(span(&path), AccessFlags::APPEND).unwrap();
        file.write(100, b"one").unwrap();
        file.write(0, b"two").unwrap();
        drop(file);

        assert_eq!(std::fs::read(&path).unwrap(), b"onetwo");
    }

    #[test]
    fn any_offset_is_ignored() {
        let scratch = ScratchDir::new("append-offset");
        let path = scratch.join("far.txt");

        let file = File::open(span(&path), AccessFlags::WRITE | AccessFlags::APPEND).unwrap();
        assert_eq!(file.write(0, b"a").unwrap(), 1);
        assert_eq!(file.write(u64::MAX, b"b").unwrap(), 1);
        file.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"ab");
    }
}

mod properties {
    use super::*;

    #[test]
    fn file_snapshot() {
        let scratch = ScratchDir::new("properties");
        let path = scratch.join("props.txt");
        std::fs::write(&path, b"twelve bytes").unwrap();

        let file = File::open(span(&path), AccessFlags::READ).unwrap();
        let properties = file.properties().unwrap();
        assert_eq!(properties.size, 12);
        assert!(!properties.is_dir());
        assert!(properties.modified.0 > 0);
        assert!(properties.created.0 > 0);
    }

    #[test]
    fn modified_time_is_recent() {
        let scratch = ScratchDir::new("properties-time");
        let path = scratch.join("time.txt");
        std::fs::write(&path, b"x").unwrap();

        let properties = properties_from_path(span(&path)).unwrap();
        let now = tea_os::DenseTime::from_unix(tea_os::time::now_unix() as i64 + 2, 0);
        let hour_ago = tea_os::DenseTime::from_unix(tea_os::time::now_unix() as i64 - 3600, 0);
        assert!(properties.modified <= now);
        assert!(properties.modified >= hour_ago);
    }

    #[test]
    fn directory_snapshot() {
        let scratch = ScratchDir::new("properties-dir");
        let path = scratch.path().to_str().unwrap().to_owned();
        let properties = properties_from_path(span(&path)).unwrap();
        assert!(properties.is_dir());
    }

    #[test]
    fn growing_file() {
        let scratch = ScratchDir::new("properties-grow");
        let path = scratch.join("grow.bin");
        let file = File::open(span(&path), AccessFlags::READ | AccessFlags::WRITE).unwrap();
        assert_eq!(file.properties().unwrap().size, 0);
        file.write(4095, &[1]).unwrap();
        assert_eq!(file.properties().unwrap().size, 4096);
    }
}

mod dirs {
    use super::*;

    #[test]
    fn second_call_reports_existing() {
        let scratch = ScratchDir::new("dir-make");
        let path = scratch.join("build");

        assert!(dir_make(span(&path)).unwrap());
        assert!(!dir_make(span(&path)).unwrap());
        assert!(std::path::Path::new(&path).is_dir());
    }

    #[test]
    fn existing_file_is_an_error() {
        let scratch = ScratchDir::new("dir-file");
        let path = scratch.join("file");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(dir_make(span(&path)).unwrap_err(), OsError::AlreadyExists);
    }

    #[test]
    fn missing_parent() {
        let scratch = ScratchDir::new("dir-parent");
        let path = scratch.join("a/b");

        assert_eq!(dir_make(span(&path)).unwrap_err(), OsError::NotFound);
    }
}
