use shelfcount_core::models::LogicalPath;
use shelfcount_core::Config;
use std::collections::BTreeMap;

/// Maps branch codes onto the folder each branch's photos are filed under.
#[derive(Debug, Clone)]
pub struct BranchFolders {
    root_folder: String,
    folders: BTreeMap<String, String>,
}

impl BranchFolders {
    pub fn new(root_folder: impl Into<String>, folders: BTreeMap<String, String>) -> Self {
        let folders = folders
            .into_iter()
            .map(|(code, name)| (code.trim().to_uppercase(), name))
            .collect();
        Self {
            root_folder: root_folder.into(),
            folders,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.upload_root_folder(), config.branch_folders().clone())
    }

    /// Folder name for a branch code. Unknown codes are used verbatim.
    pub fn folder_name(&self, branch: &str) -> String {
        let code = branch.trim();
        self.folders
            .get(&code.to_uppercase())
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// `<root folder>/<branch folder>`
    pub fn path_for(&self, branch: &str) -> LogicalPath {
        LogicalPath::from_segments([self.root_folder.clone(), self.folder_name(branch)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branches() -> BranchFolders {
        let mut map = BTreeMap::new();
        map.insert("CITY".to_string(), "สาขาตัวเมือง".to_string());
        map.insert("school".to_string(), "สาขาหน้าโรงเรียน".to_string());
        BranchFolders::new("Check Stock Project", map)
    }

    #[test]
    fn test_known_codes_are_case_insensitive() {
        let b = branches();
        assert_eq!(b.folder_name("city"), "สาขาตัวเมือง");
        assert_eq!(b.folder_name(" SCHOOL "), "สาขาหน้าโรงเรียน");
    }

    #[test]
    fn test_unknown_code_used_verbatim() {
        assert_eq!(branches().folder_name("Warehouse"), "Warehouse");
    }

    #[test]
    fn test_path_for_branch() {
        let path = branches().path_for("CITY");
        assert_eq!(path.to_string(), "Check Stock Project/สาขาตัวเมือง");

        // A blank branch files directly under the root folder.
        assert_eq!(branches().path_for("  ").segments(), ["Check Stock Project"]);
    }
}
