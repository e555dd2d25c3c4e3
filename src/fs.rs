use std::path::PathBuf;

pub fn get_home_dir() -> Option<PathBuf> {
    home::home_dir().map(|path| path.join(".dnschan"))
}
