//! 上传文件类型识别：扩展名与文件头必须一致

/// 门户接受的文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    /// doc / xls（OLE 复合文档）
    LegacyOffice,
    /// docx / xlsx（ZIP 封装）
    OpenXml,
    Text,
    Jpeg,
    Png,
    Gif,
}

impl FileKind {
    /// 由不带点的扩展名识别，大小写不敏感
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "doc" | "xls" => Some(FileKind::LegacyOffice),
            "docx" | "xlsx" => Some(FileKind::OpenXml),
            "txt" => Some(FileKind::Text),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "png" => Some(FileKind::Png),
            "gif" => Some(FileKind::Gif),
            _ => None,
        }
    }

    /// 检查文件开头的字节
    pub fn matches(self, data: &[u8]) -> bool {
        if data.is_empty() {
            return false;
        }
        match self {
            FileKind::Pdf => data.starts_with(b"%PDF"),
            FileKind::LegacyOffice => {
                data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
            }
            FileKind::OpenXml => data.starts_with(&[0x50, 0x4B, 0x03, 0x04]),
            // 纯文本没有文件头，只排除明显的二进制内容
            FileKind::Text => !data.iter().take(1024).any(|&b| b == 0),
            FileKind::Jpeg => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            FileKind::Png => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            FileKind::Gif => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        }
    }
}

/// 文件头与扩展名是否一致；未知扩展名一律拒绝
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    FileKind::from_extension(extension.trim_start_matches('.'))
        .is_some_and(|kind| kind.matches(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert!(validate_magic_bytes(&png, "png"));
        assert!(validate_magic_bytes(&png, ".PNG"));
        assert!(!validate_magic_bytes(&png, "jpg"));
        assert!(validate_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE1], "jpeg"));
        assert!(validate_magic_bytes(b"GIF89a....", "gif"));
    }

    #[test]
    fn test_documents() {
        assert!(validate_magic_bytes(b"%PDF-1.7", "pdf"));
        assert!(validate_magic_bytes(&[0x50, 0x4B, 0x03, 0x04, 0x14], "docx"));
        assert!(validate_magic_bytes(&[0x50, 0x4B, 0x03, 0x04, 0x14], "xlsx"));
        assert!(!validate_magic_bytes(b"%PDF-1.7", "doc"));
    }

    #[test]
    fn test_text_rejects_binary() {
        assert!(validate_magic_bytes(b"plain notes\n", "txt"));
        assert!(!validate_magic_bytes(&[b'a', 0, b'b'], "txt"));
    }

    #[test]
    fn test_empty_and_unknown() {
        assert!(!validate_magic_bytes(&[], "txt"));
        assert!(!validate_magic_bytes(b"MZ\x90\x00", "exe"));
        assert!(FileKind::from_extension("zip").is_none());
    }
}
