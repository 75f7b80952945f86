use crate::adapters::record::{format_good, parse_good};
use crate::domain::model::Good;
use crate::domain::ports::{Entries, GoodStore};
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

const GOOD_EXTENSION: &str = "txt";

/// 以目錄樹儲存的商店：`<shop>/<category>/<good>.txt`
#[derive(Debug, Clone, Default)]
pub struct FsGoodStore;

impl FsGoodStore {
    pub fn new() -> Self {
        Self
    }
}

impl GoodStore for FsGoodStore {
    fn categories(&self, shop: &Path) -> Result<Entries> {
        let mut dirs: Vec<_> = fs::read_dir(shop)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        // read_dir 的順序與平台相關，排序後列舉結果才可重現
        dirs.sort();
        Ok(Box::new(dirs.into_iter()))
    }

    fn goods(&self, category: &Path) -> Result<Entries> {
        let mut files: Vec<_> = fs::read_dir(category)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(GOOD_EXTENSION))
            .collect();
        files.sort();
        Ok(Box::new(files.into_iter()))
    }

    fn load(&self, path: &Path) -> Result<Good> {
        let content = fs::read_to_string(path)?;
        Ok(parse_good(&content).with_source(path))
    }

    fn save(&self, good: &Good) -> Result<()> {
        fs::write(&good.source, format_good(good))?;
        Ok(())
    }
}
