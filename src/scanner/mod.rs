use crate::error::{Result, ScoreScanError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PdfInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

const PDF_EXTENSIONS: &[&str] = &["pdf", "PDF"];

fn is_pdf_extension(ext: &str) -> bool {
    PDF_EXTENSIONS.contains(&ext)
}

fn pdf_info(path: &Path) -> Option<PdfInfo> {
    let ext = path.extension()?.to_string_lossy();
    if !is_pdf_extension(&ext) {
        return None;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    Some(PdfInfo { path: path.to_path_buf(), file_name, size })
}

/// 単一ファイルまたはフォルダ直下のPDFを列挙
pub fn scan_pdfs(target: &Path) -> Result<Vec<PdfInfo>> {
    if !target.exists() {
        return Err(ScoreScanError::FolderNotFound(target.display().to_string()));
    }

    if target.is_file() {
        return pdf_info(target)
            .map(|info| vec![info])
            .ok_or_else(|| ScoreScanError::NoPdfsFound(target.display().to_string()));
    }

    let mut pdfs: Vec<PdfInfo> = WalkDir::new(target)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| pdf_info(e.path()))
        .collect();

    // ファイル名でソート
    pdfs.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_is_pdf_extension() {
        assert!(is_pdf_extension("pdf"));
        assert!(is_pdf_extension("PDF"));
        assert!(!is_pdf_extension("png"));
        assert!(!is_pdf_extension("txt"));
    }

    #[test]
    fn test_scan_not_found() {
        let result = scan_pdfs(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(ScoreScanError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("b_marsch.pdf")).unwrap().write_all(b"%PDF-1.4").unwrap();
        File::create(dir.path().join("a_polka.PDF")).unwrap().write_all(b"%PDF").unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("c.pdf")).unwrap();

        let result = scan_pdfs(dir.path()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].file_name, "a_polka.PDF");
        assert_eq!(result[1].file_name, "b_marsch.pdf");
        assert_eq!(result[1].size, 8);
    }

    #[test]
    fn test_scan_single_file() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("walzer.pdf");
        File::create(&pdf).unwrap();
        assert_eq!(scan_pdfs(&pdf).unwrap().len(), 1);

        let txt = dir.path().join("walzer.txt");
        File::create(&txt).unwrap();
        assert!(matches!(scan_pdfs(&txt), Err(ScoreScanError::NoPdfsFound(_))));
    }
}
