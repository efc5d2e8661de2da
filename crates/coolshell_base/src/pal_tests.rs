/* 📖 # PAL behavioural parity tests

The engine is tested almost entirely against MockPal and run in production
against RealPal. These tests build the same small site tree in both and check
that walks and reads agree.
*/

#[cfg(test)]
mod pal_parity_tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::pal::{FilePath, MockPal, Pal, PalHandle, RealPal};

    const SITE: &[(&str, &str)] = &[
        ("content/articles/2019/b.html", "<p>b</p>"),
        ("content/articles/2020/a.html", "<p>a</p>"),
        ("content/articles/2020.html", "<p>2020</p>"),
        ("content/articles/index.html", "<p>index</p>"),
        ("content/list/1.html", "<p>page 1</p>"),
    ];

    fn mock_site() -> PalHandle {
        let mock = MockPal::new();
        for (path, content) in SITE {
            mock.add_file(FilePath::from(*path), content.as_bytes().to_vec());
        }
        PalHandle::new(mock)
    }

    fn real_site() -> (TempDir, PalHandle) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        for (path, content) in SITE {
            let full = temp_dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let pal = PalHandle::new(RealPal::new(temp_dir.path().to_path_buf()));
        (temp_dir, pal)
    }

    fn walk(pal: &PalHandle, root: &str) -> Vec<String> {
        pal.walk_directory(&FilePath::from(root), &["**/*".to_string()])
            .unwrap()
            .map(|p| p.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_walks_agree() {
        let mock = mock_site();
        let (_temp_dir, real) = real_site();

        let expected = vec![
            "content/articles/2019/b.html",
            "content/articles/2020/a.html",
            "content/articles/2020.html",
            "content/articles/index.html",
        ];
        assert_eq!(walk(&mock, "content/articles"), expected);
        assert_eq!(walk(&real, "content/articles"), expected);
    }

    #[test]
    fn test_reads_agree() {
        let mock = mock_site();
        let (_temp_dir, real) = real_site();

        for (path, content) in SITE {
            let path = FilePath::from(*path);
            assert_eq!(mock.read_file_to_string(&path).unwrap(), *content);
            assert_eq!(real.read_file_to_string(&path).unwrap(), *content);
        }
    }

    #[test]
    fn test_directories_are_not_files() {
        let mock = mock_site();
        let (_temp_dir, real) = real_site();

        let dir = FilePath::from("content/articles/2019");
        assert!(!mock.file_exists(&dir).unwrap());
        assert!(!real.file_exists(&dir).unwrap());
    }

    #[test]
    fn test_read_file_to_string_invalid_utf8() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("bad.txt"), vec![0xFF, 0xFE]);

        let result = mock.read_file_to_string(&FilePath::from("bad.txt"));
        assert!(result.is_err());
    }
}
