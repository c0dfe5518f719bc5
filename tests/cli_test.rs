// Tests of the command line interface.
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use lytkit::fio::FileType;
use lytkit::gdsii::builder::*;
use lytkit::gdsii::{GdsBuilder,GdsCreator,GdsPoint};

fn write_fixture(path: &str) {
    let date = GdsDate { year: 2004, month: 3, day: 2, hour: 0, minute: 0, second: 0 };
    let mut creator = GdsCreator::create(path,FileType::Auto).expect("create failed");
    creator.gds_version(600).unwrap();
    creator.begin_library("CLILIB",&date,&date,
        &GdsUnits { db_to_user: 0.001, db_to_meter: 1e-9 },
        &GdsLibraryOptions::default()).unwrap();
    creator.begin_structure("TOP",&date,&date,&GdsStructureOptions::default()).unwrap();
    creator.begin_boundary(1,0,&[GdsPoint::new(0,0),GdsPoint::new(10,0),GdsPoint::new(10,10),
        GdsPoint::new(0,10),GdsPoint::new(0,0)],&GdsElementOptions::default()).unwrap();
    creator.end_element().unwrap();
    creator.begin_sref("SUB",100,100,&None,&GdsElementOptions::default()).unwrap();
    creator.end_element().unwrap();
    creator.end_structure().unwrap();
    creator.begin_structure("SUB",&date,&date,&GdsStructureOptions::default()).unwrap();
    creator.begin_boundary(2,0,&[GdsPoint::new(0,0),GdsPoint::new(5,0),GdsPoint::new(5,5),
        GdsPoint::new(0,5),GdsPoint::new(0,0)],&GdsElementOptions::default()).unwrap();
    creator.end_element().unwrap();
    creator.end_structure().unwrap();
    creator.end_library().unwrap();
}

#[test]
fn cells_lists_structures() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    write_fixture(&gds);
    let mut cmd = Command::cargo_bin("lytkit").expect("no binary");
    cmd.arg("cells").arg(&gds)
        .assert()
        .success()
        .stdout(predicate::str::diff("TOP\nSUB\n"));
}

#[test]
fn copy_is_byte_exact() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    let copy = dir.path().join("b.gds").to_str().unwrap().to_string();
    write_fixture(&gds);
    let mut cmd = Command::cargo_bin("lytkit").expect("no binary");
    cmd.arg("copy").arg(&gds).arg(&copy).assert().success();
    assert_eq!(std::fs::read(&gds).expect("read failed"),
        std::fs::read(&copy).expect("read failed"));
}

#[test]
fn dot_emits_digraph() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    write_fixture(&gds);
    let mut cmd = Command::cargo_bin("lytkit").expect("no binary");
    cmd.arg("dot").arg(&gds)
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph \"CLILIB\""))
        .stdout(predicate::str::contains("\"TOP\" -> \"SUB\";"));
}

#[test]
fn ascii_round_trip() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    let txt = dir.path().join("a.txt").to_str().unwrap().to_string();
    let back = dir.path().join("b.gds").to_str().unwrap().to_string();
    write_fixture(&gds);
    Command::cargo_bin("lytkit").expect("no binary")
        .arg("gds2ascii").arg(&gds).arg(&txt).assert().success();
    Command::cargo_bin("lytkit").expect("no binary")
        .arg("ascii2gds").arg(&txt).arg(&back).assert().success();
    assert_eq!(std::fs::read(&gds).expect("read failed"),
        std::fs::read(&back).expect("read failed"));
}

#[test]
fn convert_validate_print() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    let oas = dir.path().join("a.oas").to_str().unwrap().to_string();
    write_fixture(&gds);
    Command::cargo_bin("lytkit").expect("no binary")
        .arg("gds2oasis").arg(&gds).arg(&oas).assert().success();
    Command::cargo_bin("lytkit").expect("no binary")
        .arg("validate").arg(&oas)
        .assert()
        .success()
        .stdout(predicate::str::contains("crc32"))
        .stdout(predicate::str::contains("validated"));
    Command::cargo_bin("lytkit").expect("no binary")
        .arg("print").arg(&oas)
        .assert()
        .success()
        .stdout(predicate::str::contains("CELL \"TOP\""))
        .stdout(predicate::str::contains("PLACEMENT \"SUB\""));
    // a missing cell is an error
    Command::cargo_bin("lytkit").expect("no binary")
        .arg("print").arg("-c").arg("NOWHERE").arg(&oas)
        .assert()
        .failure();
}

#[test]
fn recstats_counts() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    write_fixture(&gds);
    let mut cmd = Command::cargo_bin("lytkit").expect("no binary");
    cmd.arg("recstats").arg(&gds)
        .assert()
        .success()
        .stdout(predicate::str::contains("BGNSTR"))
        .stdout(predicate::str::contains("total"));
}
