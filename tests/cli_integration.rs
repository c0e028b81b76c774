//! CLI integration tests
//!
//! Tests the command-line interface end-to-end.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Get path to the securefile binary
fn securefile_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps/
    path.push("securefile");
    path
}

/// Run securefile with `stdin` piped in, passphrase reading switched to stdin
fn run_securefile_with_stdin(
    args: &[&str],
    stdin_data: &str,
) -> Result<std::process::Output, std::io::Error> {
    let mut child = Command::new(securefile_bin())
        .arg("--passphrase-stdin")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        // The command may exit before reading stdin when it fails early
        let _ = stdin.write_all(stdin_data.as_bytes());
    }

    child.wait_with_output()
}

/// Get path to testdata directory
fn testdata_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("testdata");
    path.push(filename);
    path
}

/// Decrypt a container produced outside this crate.
#[test]
fn test_decrypt_known_container() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("hello-decrypted.txt");

    let result = run_securefile_with_stdin(
        &[
            "decrypt",
            "-i",
            testdata_path("hello.ssf").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ],
        "test",
    )
    .unwrap();

    assert!(
        result.status.success(),
        "decrypt failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let decrypted = fs::read_to_string(&output).unwrap();
    let expected = fs::read_to_string(testdata_path("hello.txt")).unwrap();
    assert_eq!(decrypted, expected);
}

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext_path = testdata_path("hello.txt");
    let encrypted_path = temp_dir.path().join("hello-encrypted.ssf");
    let decrypted_path = temp_dir.path().join("hello-decrypted.txt");

    let result = run_securefile_with_stdin(
        &[
            "encrypt",
            "-i",
            plaintext_path.to_str().unwrap(),
            "-o",
            encrypted_path.to_str().unwrap(),
        ],
        "test\n",
    )
    .unwrap();

    assert!(
        result.status.success(),
        "encrypt failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    // 12 bytes of plaintext pad to one block behind the IV
    assert_eq!(fs::metadata(&encrypted_path).unwrap().len(), 32);

    let result = run_securefile_with_stdin(
        &[
            "decrypt",
            "-i",
            encrypted_path.to_str().unwrap(),
            "-o",
            decrypted_path.to_str().unwrap(),
        ],
        "test\n",
    )
    .unwrap();

    assert!(
        result.status.success(),
        "decrypt failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let original = fs::read_to_string(&plaintext_path).unwrap();
    let decrypted = fs::read_to_string(&decrypted_path).unwrap();
    assert_eq!(original, decrypted);
}

#[test]
fn test_default_output_names() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("report.pdf");
    fs::write(&plaintext, b"%PDF-1.4 not really").unwrap();

    let result =
        run_securefile_with_stdin(&["secure", "-i", plaintext.to_str().unwrap()], "hunter2")
            .unwrap();
    assert!(
        result.status.success(),
        "encrypt failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let secured = temp_dir.path().join("report.ssf");
    assert!(secured.exists());

    let result = run_securefile_with_stdin(
        &["access", "-i", secured.to_str().unwrap(), "--ext", "txt"],
        "hunter2",
    )
    .unwrap();
    assert!(
        result.status.success(),
        "decrypt failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let restored = fs::read(temp_dir.path().join("report.txt")).unwrap();
    assert_eq!(restored, b"%PDF-1.4 not really");
}

#[test]
fn test_wrong_passphrase_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("output.txt");

    let result = run_securefile_with_stdin(
        &[
            "decrypt",
            "-i",
            testdata_path("hello.ssf").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ],
        "not the passphrase",
    )
    .unwrap();

    // A wrong key can occasionally unpad cleanly; this one is known not to.
    assert!(!result.status.success());
    assert!(!output.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("passphrase"),
        "Expected error message about the passphrase, got: {}",
        stderr
    );
}

#[test]
fn test_decrypt_nonexistent_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let nonexistent = temp_dir.path().join("nonexistent.ssf");
    let output = temp_dir.path().join("output.txt");

    let result = run_securefile_with_stdin(
        &[
            "decrypt",
            "-i",
            nonexistent.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ],
        "test",
    )
    .unwrap();

    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn test_decrypt_without_secured_extension_needs_output() {
    let result = run_securefile_with_stdin(
        &["decrypt", "-i", testdata_path("hello.txt").to_str().unwrap()],
        "test",
    )
    .unwrap();

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("--output"),
        "Expected a hint about --output, got: {}",
        stderr
    );
}

#[test]
fn test_truncated_container_fails() {
    let temp_dir = TempDir::new().unwrap();
    let truncated = temp_dir.path().join("short.ssf");
    let output = temp_dir.path().join("short.txt");
    fs::write(&truncated, [0u8; 10]).unwrap();

    let result = run_securefile_with_stdin(
        &[
            "decrypt",
            "-i",
            truncated.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ],
        "test",
    )
    .unwrap();

    assert!(!result.status.success());
    assert!(!output.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("truncated"),
        "Expected a truncation error, got: {}",
        stderr
    );
}

#[test]
fn test_empty_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("empty.txt");
    let encrypted = temp_dir.path().join("empty.ssf");
    let decrypted = temp_dir.path().join("empty-decrypted.txt");

    fs::write(&plaintext, b"").unwrap();

    let result = run_securefile_with_stdin(
        &[
            "encrypt",
            "-i",
            plaintext.to_str().unwrap(),
            "-o",
            encrypted.to_str().unwrap(),
        ],
        "test",
    )
    .unwrap();
    assert!(result.status.success());
    assert_eq!(fs::metadata(&encrypted).unwrap().len(), 32);

    let result = run_securefile_with_stdin(
        &[
            "decrypt",
            "-i",
            encrypted.to_str().unwrap(),
            "-o",
            decrypted.to_str().unwrap(),
        ],
        "test",
    )
    .unwrap();

    assert!(result.status.success());
    let content = fs::read(&decrypted).unwrap();
    assert_eq!(content, b"");
}

#[test]
fn test_large_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("large.bin");
    let encrypted = temp_dir.path().join("large.ssf");
    let decrypted = temp_dir.path().join("large-decrypted.bin");

    let large_content = vec![0x42u8; 1024 * 1024];
    fs::write(&plaintext, &large_content).unwrap();

    let result = run_securefile_with_stdin(
        &[
            "encrypt",
            "-i",
            plaintext.to_str().unwrap(),
            "-o",
            encrypted.to_str().unwrap(),
        ],
        "test",
    )
    .unwrap();
    assert!(result.status.success());

    let result = run_securefile_with_stdin(
        &[
            "decrypt",
            "-i",
            encrypted.to_str().unwrap(),
            "-o",
            decrypted.to_str().unwrap(),
        ],
        "test",
    )
    .unwrap();

    assert!(result.status.success());
    let decrypted_content = fs::read(&decrypted).unwrap();
    assert_eq!(decrypted_content, large_content);
}

#[test]
fn test_interactive_session_from_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("notes.txt");
    fs::write(&plaintext, "meeting at noon\n").unwrap();
    let secured = temp_dir.path().join("notes.ssf");

    // Restoring to .md avoids clobbering the original
    let script = format!(
        "secure\n{}\nopen sesame\naccess\n{}\nopen sesame\nmd\nquit\n",
        plaintext.display(),
        secured.display()
    );

    let result = run_securefile_with_stdin(&["interactive"], &script).unwrap();

    assert!(
        result.status.success(),
        "interactive session failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("was successfully encrypted."), "{}", stdout);
    assert!(stdout.contains("was successfully decrypted."), "{}", stdout);

    let restored = fs::read_to_string(temp_dir.path().join("notes.md")).unwrap();
    assert_eq!(restored, "meeting at noon\n");
}

#[test]
fn test_encrypt_refuses_to_overwrite_input() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("report.ssf");
    fs::write(&plaintext, "secret notes").unwrap();

    let result =
        run_securefile_with_stdin(&["encrypt", "-i", plaintext.to_str().unwrap()], "pw\n").unwrap();

    assert!(!result.status.success());
    assert_eq!(fs::read_to_string(&plaintext).unwrap(), "secret notes");
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("refusing to overwrite"),
        "Expected a same-file error, got: {}",
        stderr
    );
}

#[test]
fn test_decrypt_refuses_to_overwrite_container() {
    let temp_dir = TempDir::new().unwrap();
    let container = temp_dir.path().join("hello.ssf");
    fs::copy(testdata_path("hello.ssf"), &container).unwrap();
    let original = fs::read(&container).unwrap();

    let result = run_securefile_with_stdin(
        &["decrypt", "-i", container.to_str().unwrap(), "--ext", "ssf"],
        "test",
    )
    .unwrap();

    assert!(!result.status.success());
    assert_eq!(fs::read(&container).unwrap(), original);
}

#[test]
fn test_empty_secured_extension_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("notes");
    fs::write(&plaintext, "notes").unwrap();

    let result = run_securefile_with_stdin(
        &["--secured-ext", "", "encrypt", "-i", plaintext.to_str().unwrap()],
        "pw",
    )
    .unwrap();

    assert!(!result.status.success());
    assert_eq!(fs::read_to_string(&plaintext).unwrap(), "notes");
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_secured_extension_accepts_leading_dot() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("notes.txt");
    fs::write(&plaintext, "notes").unwrap();

    let result = run_securefile_with_stdin(
        &["--secured-ext", ".locked", "encrypt", "-i", plaintext.to_str().unwrap()],
        "pw",
    )
    .unwrap();

    assert!(
        result.status.success(),
        "encrypt failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert!(temp_dir.path().join("notes.locked").exists());
}
