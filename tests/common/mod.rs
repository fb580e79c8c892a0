//! Shared helpers for integration tests
#![allow(dead_code)]

pub mod mock_jenkins;

use std::path::Path;

pub use mock_jenkins::{MockJenkins, MockJenkinsBehavior, RecordedRequest};

pub const VALID_PIPELINE: &str = r#"pipeline {
    agent any
    stages {
        stage('Build') {
            steps {
                sh 'make'
            }
        }
    }
}
"#;

/// Write a Jenkinsfile named `name` under `dir`
pub fn write_jenkinsfile(dir: &Path, name: &str, content: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// A local port with nothing listening on it
pub fn closed_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
