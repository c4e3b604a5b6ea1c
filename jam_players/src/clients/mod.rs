use std::path::PathBuf;

pub trait IClient {
    fn fetch(&mut self) -> Result<String, Box<dyn std::error::Error>>;
}

// 決まったデータを返すクライアント
#[derive(Default)]
pub struct SampleClient;

impl IClient for SampleClient {
    // 常に成功する
    fn fetch(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        let data = include_str!("example.csv");
        Ok(data.to_string())
    }
}

// ローカルの CSV を読むクライアント
pub struct FileClient {
    path: PathBuf,
}

impl FileClient {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl IClient for FileClient {
    fn fetch(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(&self.path)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileClient, IClient, SampleClient};

    #[test]
    fn sample() {
        let data = SampleClient.fetch().unwrap();
        let users = crate::deserialize(&data).unwrap();
        assert_eq!(users.len(), 8);
        assert_eq!(users[0].username, "alice_drums");
    }

    #[test]
    fn file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("roster.csv");
        std::fs::write(&path, "name,property_name,value\nz,instrument,KEYS\n").unwrap();

        let data = FileClient::new(&path).fetch().unwrap();
        assert_eq!(crate::deserialize(&data).unwrap()[0].name, "z");

        assert!(FileClient::new(directory.path().join("missing.csv"))
            .fetch()
            .is_err());
    }
}
