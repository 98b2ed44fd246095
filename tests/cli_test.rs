use assert_cmd::prelude::*; // Add methods on commands
use std::process::Command; // Run programs
use tempfile;

type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Round-trips `data` through the `compress`/`expand` subcommands with
/// method `mlz`, using temp files as the pack ships no reference corpus for
/// this codec.
fn roundtrip(data: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("input.bin");
    let cmp_path = temp_dir.path().join("compressed.mlz");
    let out_path = temp_dir.path().join("output.bin");
    std::fs::write(&in_path,data)?;

    Command::cargo_bin("mlz-codec")?
        .arg("compress")
        .arg("-m").arg("mlz")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&cmp_path)
        .assert()
        .success();

    Command::cargo_bin("mlz-codec")?
        .arg("expand")
        .arg("-m").arg("mlz")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();

    let expanded = std::fs::read(&out_path)?;
    assert_eq!(expanded,data);
    Ok(())
}

#[test]
fn mlz_roundtrip_short_text() -> STDRESULT {
    roundtrip(b"abracadabra abracadabra abracadabra")
}

#[test]
fn mlz_roundtrip_empty_file() -> STDRESULT {
    roundtrip(b"")
}

#[test]
fn mlz_roundtrip_repeated_byte() -> STDRESULT {
    roundtrip(&vec![b'x'; 256])
}

#[test]
fn mlz_roundtrip_all_byte_values() -> STDRESULT {
    let data: Vec<u8> = (0..=255u8).collect();
    roundtrip(&data)
}

#[test]
fn mlz_compress_with_mask_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let data = b"AAAAAAAABBBBBBBB";
    let in_path = temp_dir.path().join("input.bin");
    let mask_path = temp_dir.path().join("mask.bin");
    let cmp_path = temp_dir.path().join("compressed.mlz");
    let out_path = temp_dir.path().join("output.bin");
    std::fs::write(&in_path,data)?;
    std::fs::write(&mask_path,vec![0u8; data.len()])?;

    Command::cargo_bin("mlz-codec")?
        .arg("compress")
        .arg("-m").arg("mlz")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&cmp_path)
        .arg("-k").arg(&mask_path)
        .assert()
        .success();

    Command::cargo_bin("mlz-codec")?
        .arg("expand")
        .arg("-m").arg("mlz")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();

    let expanded = std::fs::read(&out_path)?;
    assert_eq!(expanded,data.to_vec());
    Ok(())
}

#[test]
fn mlz_expand_rejects_truncated_input() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("truncated.mlz");
    let out_path = temp_dir.path().join("output.bin");
    std::fs::write(&in_path,[0u8,0u8])?; // shorter than the 4-byte size header

    Command::cargo_bin("mlz-codec")?
        .arg("expand")
        .arg("-m").arg("mlz")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn mlz_compress_rejects_out_of_range_mask_byte() -> STDRESULT {
    // A mask file with a byte outside 0..=7 (e.g. a non-mask file fed in by
    // mistake) must fail cleanly, not panic.
    let temp_dir = tempfile::tempdir()?;
    let data = b"AAAAAAAA";
    let in_path = temp_dir.path().join("input.bin");
    let mask_path = temp_dir.path().join("mask.bin");
    let cmp_path = temp_dir.path().join("compressed.mlz");
    std::fs::write(&in_path,data)?;
    std::fs::write(&mask_path,vec![200u8; data.len()])?;

    Command::cargo_bin("mlz-codec")?
        .arg("compress")
        .arg("-m").arg("mlz")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&cmp_path)
        .arg("-k").arg(&mask_path)
        .assert()
        .failure();
    Ok(())
}
