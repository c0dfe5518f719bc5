// Round-trip and inspection tests for the GDSII parser/creator pair.
use std::path::Path;
use lytkit::fio::FileType;
use lytkit::gdsii::builder::*;
use lytkit::gdsii::{GdsBuilder,GdsCreator,GdsParser,GdsPoint};

fn date(h: i16) -> GdsDate {
    GdsDate { year: 2004, month: 3, day: 2, hour: h, minute: 30, second: 0 }
}

fn units() -> GdsUnits {
    GdsUnits { db_to_user: 0.001, db_to_meter: 1e-9 }
}

/// Emit a small library exercising every element kind.
fn emit_library(builder: &mut dyn GdsBuilder) -> Result<(),Box<dyn std::error::Error>> {
    builder.gds_version(600)?;
    builder.begin_library("MYLIB",&date(1),&date(2),&units(),&GdsLibraryOptions::default())?;
    builder.begin_structure("TOP",&date(3),&date(4),&GdsStructureOptions::default())?;

    let square = vec![GdsPoint::new(0,0),GdsPoint::new(1000,0),GdsPoint::new(1000,1000),
        GdsPoint::new(0,1000),GdsPoint::new(0,0)];
    builder.begin_boundary(1,0,&square,&GdsElementOptions::default())?;
    builder.add_property(1,"first")?;
    builder.add_property(2,"second")?;
    builder.end_element()?;

    let mut path_options = GdsPathOptions::default();
    path_options.pathtype = Some(GdsPathtype::Custom);
    path_options.width = Some(50);
    path_options.bgnextn = Some(10);
    path_options.endextn = Some(0);
    builder.begin_path(2,3,&[GdsPoint::new(0,0),GdsPoint::new(500,0),GdsPoint::new(500,500)],
        &path_options)?;
    builder.end_element()?;

    let strans = Some(GdsTransform {
        reflect: true,
        abs_mag: false,
        abs_angle: false,
        mag: Some(0.5),
        angle: Some(90.0)
    });
    builder.begin_sref("SUB",2000,3000,&strans,&GdsElementOptions::default())?;
    builder.end_element()?;

    builder.begin_aref("SUB",3,2,
        &[GdsPoint::new(0,0),GdsPoint::new(3000,0),GdsPoint::new(0,4000)],
        &None,&GdsElementOptions::default())?;
    builder.end_element()?;

    let mut text_options = GdsTextOptions::default();
    text_options.presentation = Some(5);
    builder.begin_text(4,1,100,200,"hello",&None,&text_options)?;
    builder.end_element()?;

    builder.begin_node(5,0,&[GdsPoint::new(0,0),GdsPoint::new(10,10)],
        &GdsElementOptions::default())?;
    builder.end_element()?;

    builder.begin_box(6,0,&[GdsPoint::new(0,0),GdsPoint::new(100,0),GdsPoint::new(100,200),
        GdsPoint::new(0,200),GdsPoint::new(0,0)],&GdsElementOptions::default())?;
    builder.end_element()?;

    builder.end_structure()?;
    builder.begin_structure("SUB",&date(5),&date(6),&GdsStructureOptions::default())?;
    builder.begin_boundary(1,0,&square,&GdsElementOptions::default())?;
    builder.end_element()?;
    builder.end_structure()?;
    builder.end_library()
}

fn create_file(path: &str) {
    let mut creator = GdsCreator::create(path,FileType::Auto).expect("create failed");
    emit_library(&mut creator).expect("emit failed");
}

#[test]
fn byte_exact_round_trip() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let first = dir.path().join("a.gds").to_str().unwrap().to_string();
    let second = dir.path().join("b.gds").to_str().unwrap().to_string();
    create_file(&first);
    // parse the first file straight into a creator for the second
    let mut parser = GdsParser::open(&first,FileType::Auto,None).expect("open failed");
    let mut creator = GdsCreator::create(&second,FileType::Auto).expect("create failed");
    parser.parse_file(&mut creator).expect("parse failed");
    let bytes1 = std::fs::read(&first).expect("read failed");
    let bytes2 = std::fs::read(&second).expect("read failed");
    assert_eq!(bytes1,bytes2);
}

#[test]
fn gzip_round_trip() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let plain = dir.path().join("a.gds").to_str().unwrap().to_string();
    let zipped = dir.path().join("a.gds.gz").to_str().unwrap().to_string();
    create_file(&plain);
    create_file(&zipped);
    assert!(std::fs::read(&zipped).expect("read failed").starts_with(&[0x1f,0x8b]));
    // scanning the gzip file yields the same records
    let mut parser = GdsParser::open(&zipped,FileType::Auto,None).expect("open failed");
    let unzipped = dir.path().join("b.gds").to_str().unwrap().to_string();
    let mut creator = GdsCreator::create(&unzipped,FileType::Auto).expect("create failed");
    parser.parse_file(&mut creator).expect("parse failed");
    assert_eq!(std::fs::read(&plain).expect("read failed"),
        std::fs::read(&unzipped).expect("read failed"));
}

#[test]
fn index_and_single_structure() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let path = dir.path().join("a.gds").to_str().unwrap().to_string();
    create_file(&path);
    let mut parser = GdsParser::open(&path,FileType::Auto,None).expect("open failed");
    let index = parser.make_index().expect("index failed");
    assert_eq!(index.names(),&["TOP".to_string(),"SUB".to_string()]);
    assert!(index.get("TOP").is_some());
    assert!(index.get("NOWHERE").is_none());

    struct CountElements {
        structures: Vec<String>,
        boundaries: usize
    }
    impl GdsBuilder for CountElements {
        fn begin_structure(&mut self,sname: &str,_c: &GdsDate,_m: &GdsDate,
            _o: &GdsStructureOptions) -> Result<(),Box<dyn std::error::Error>> {
            self.structures.push(sname.to_string());
            Ok(())
        }
        fn begin_boundary(&mut self,_l: i16,_d: i16,_p: &[GdsPoint],
            _o: &GdsElementOptions) -> Result<(),Box<dyn std::error::Error>> {
            self.boundaries += 1;
            Ok(())
        }
    }
    let mut counter = CountElements { structures: Vec::new(), boundaries: 0 };
    let found = parser.parse_structure("SUB",&mut counter).expect("parse failed");
    assert!(found);
    assert_eq!(counter.structures,vec!["SUB".to_string()]);
    assert_eq!(counter.boundaries,1);
    let found = parser.parse_structure("NOWHERE",&mut counter).expect("parse failed");
    assert!(!found);
}

#[test]
fn warnings_and_tolerance() {
    // a path with extension records but PATHTYPE 0 is tolerated with a
    // warning, and the type is forced to 4
    let dir = tempfile::tempdir().expect("no temp dir");
    let path = dir.path().join("a.gds").to_str().unwrap().to_string();
    {
        let mut creator = GdsCreator::create(&path,FileType::Auto).expect("create failed");
        creator.gds_version(600).unwrap();
        creator.begin_library("L",&date(0),&date(0),&units(),&GdsLibraryOptions::default()).unwrap();
        creator.begin_structure("S",&date(0),&date(0),&GdsStructureOptions::default()).unwrap();
        let mut options = GdsPathOptions::default();
        options.width = Some(10);
        options.bgnextn = Some(5);
        creator.begin_path(1,0,&[GdsPoint::new(0,0),GdsPoint::new(100,0)],&options).unwrap();
        creator.end_element().unwrap();
        creator.end_structure().unwrap();
        creator.end_library().unwrap();
    }
    struct PathCheck {
        pathtype: Option<GdsPathtype>
    }
    impl GdsBuilder for PathCheck {
        fn begin_path(&mut self,_l: i16,_d: i16,_p: &[GdsPoint],
            options: &GdsPathOptions) -> Result<(),Box<dyn std::error::Error>> {
            self.pathtype = options.pathtype;
            Ok(())
        }
    }
    let warnings = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = warnings.clone();
    let mut parser = GdsParser::open(&path,FileType::Auto,
        Some(Box::new(move |msg: &str| sink.borrow_mut().push(msg.to_string())))).expect("open failed");
    let mut check = PathCheck { pathtype: None };
    parser.parse_file(&mut check).expect("parse failed");
    assert_eq!(check.pathtype,Some(GdsPathtype::Custom));
    assert!(warnings.borrow().iter().any(|w| w.contains("force path type 4")
        || w.contains("extension records force path type 4")),"{:?}",warnings.borrow());
}

#[test]
fn bad_file_is_fatal() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let path = dir.path().join("bad.gds").to_str().unwrap().to_string();
    // record type 53 (RESERVED) is declared invalid
    std::fs::write(&path,[0u8,4,53,0]).expect("write failed");
    let mut parser = GdsParser::open(&path,FileType::Auto,None).expect("open failed");
    struct Sink {}
    impl GdsBuilder for Sink {}
    let err = parser.parse_file(&mut Sink {}).err().expect("should fail");
    assert!(err.to_string().contains("invalid record type 53"),"{}",err);
    assert!(err.to_string().contains(Path::new(&path).to_str().unwrap()));
}
