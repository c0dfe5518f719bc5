// Semantic round-trip and validation tests for the OASIS parser/creator.
use lytkit::fio::FileType;
use lytkit::oasis::names::{OasisName,Property,PropValue};
use lytkit::oasis::oreal::Oreal;
use lytkit::oasis::printer::OasisPrinter;
use lytkit::oasis::rep::{Delta,Repetition};
use lytkit::oasis::trapezoid::{Orientation,Trapezoid};
use lytkit::oasis::validate::{validate_file,ValScheme};
use lytkit::oasis::{OasisBuilder,OasisCreator,OasisParser,OasisParserOptions};

type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn prop(name: &str,values: Vec<PropValue>) -> Property {
    Property { name: OasisName::new(name.as_bytes(),0), values, is_standard: false }
}

/// Emit a file exercising every element kind, repetitions, modal reuse,
/// and properties at all three levels.
fn emit_layout(builder: &mut dyn OasisBuilder) -> STDRESULT {
    builder.begin_file("1.0",&Oreal::Integer(1000),ValScheme::Crc32)?;
    builder.add_file_property(&prop("AUTHOR",vec![PropValue::AString(b"nobody".to_vec())]))?;
    builder.begin_cell(&OasisName::new(b"TOP",0))?;
    builder.add_cell_property(&prop("COUNT",vec![PropValue::Unsigned(2),
        PropValue::Real(Oreal::Ratio(1,3))]))?;

    builder.begin_rectangle(1,0,0,0,100,50,None)?;
    builder.end_element()?;
    // same layer and size through the modal state, with a repetition
    builder.begin_rectangle(1,0,500,0,100,50,
        Some(&Repetition::Matrix { cols: 4, rows: 3, col_space: 200, row_space: 100 }))?;
    builder.end_element()?;

    builder.begin_polygon(2,1,0,1000,&[Delta::new(0,0),Delta::new(100,0),Delta::new(50,80)],None)?;
    builder.add_element_property(&prop("AREA",vec![PropValue::Signed(-4000)]))?;
    builder.end_element()?;

    builder.begin_path(2,1,0,2000,10,10,0,
        &[Delta::new(0,0),Delta::new(200,0),Delta::new(200,200)],
        Some(&Repetition::UniformY { dim: 5, space: 400 }))?;
    builder.end_element()?;

    builder.begin_trapezoid(3,0,50,50,
        &Trapezoid::new(Orientation::Horizontal,60,20,7,-3).expect("bad trapezoid"),None)?;
    builder.end_element()?;
    // this one compresses to a ctrapezoid
    builder.begin_trapezoid(3,0,300,50,
        &Trapezoid::new(Orientation::Horizontal,60,20,0,0).expect("bad trapezoid"),None)?;
    builder.end_element()?;

    builder.begin_circle(4,0,-100,-100,25,None)?;
    builder.end_element()?;

    builder.begin_text(5,2,10,20,&OasisName::new(b"pin_a",0),None)?;
    builder.end_element()?;

    builder.begin_xelement(9,&[1,2,3])?;
    builder.end_element()?;
    builder.begin_xgeometry(6,0,40,40,99,&[4,5,6],None)?;
    builder.end_element()?;

    builder.begin_placement(&OasisName::new(b"SUB",0),5000,5000,
        &Oreal::Integer(1),&Oreal::Integer(90),false,None)?;
    builder.end_element()?;
    builder.begin_placement(&OasisName::new(b"SUB",0),9000,5000,
        &Oreal::Float64(1.5),&Oreal::Float64(45.0),true,
        Some(&Repetition::Arbitrary { offsets: vec![Delta::new(0,0),Delta::new(17,33)] }))?;
    builder.end_element()?;

    builder.end_cell()?;
    builder.begin_cell(&OasisName::new(b"SUB",0))?;
    builder.begin_rectangle(1,0,0,0,10,10,None)?;
    builder.end_element()?;
    builder.end_cell()?;
    builder.end_file()
}

fn print_file(path: &str) -> String {
    let mut out = Vec::new();
    let mut parser = OasisParser::open(path,None,&OasisParserOptions::default()).expect("open failed");
    let mut printer = OasisPrinter::new(&mut out);
    parser.parse_file(&mut printer).expect("parse failed");
    String::from_utf8(out).expect("printer is not utf8")
}

#[test]
fn semantic_round_trip() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let first = dir.path().join("a.oas").to_str().unwrap().to_string();
    let second = dir.path().join("b.oas").to_str().unwrap().to_string();
    {
        let mut creator = OasisCreator::create(&first,FileType::Auto,ValScheme::Crc32).expect("create failed");
        emit_layout(&mut creator).expect("emit failed");
    }
    let text1 = print_file(&first);
    // feed the parse of the first file into a second creator
    {
        let mut parser = OasisParser::open(&first,None,&OasisParserOptions::default()).expect("open failed");
        let mut creator = OasisCreator::create(&second,FileType::Auto,ValScheme::Crc32).expect("create failed");
        parser.parse_file(&mut creator).expect("parse failed");
    }
    let text2 = print_file(&second);
    assert_eq!(text1,text2);
    // sanity: the events we emitted actually show up
    assert!(text1.contains("CELL \"TOP\""));
    assert!(text1.contains("rep=matrix 4x3 step 200,100"));
    assert!(text1.contains("PLACEMENT \"SUB\" at (5000,5000) mag 1 angle 90"));
    assert!(text1.contains("CELL-PROPERTY \"COUNT\" 2 1/3"));
    assert!(text1.contains("TRAPEZOID layer 3 datatype 0 at (50,50) horizontal 60x20 delta_a 7 delta_b -3"));
    assert!(text1.contains("XGEOMETRY layer 6 datatype 0 at (40,40) attribute 99 data 040506"));
}

#[test]
fn validation_schemes() {
    let dir = tempfile::tempdir().expect("no temp dir");
    for scheme in [ValScheme::None,ValScheme::Crc32,ValScheme::Checksum32] {
        let path = dir.path().join(format!("{}.oas",scheme.name())).to_str().unwrap().to_string();
        let mut creator = OasisCreator::create(&path,FileType::Auto,scheme).expect("create failed");
        emit_layout(&mut creator).expect("emit failed");
        let val = validate_file(&path).expect("validation failed");
        assert_eq!(val.scheme,scheme);
    }
}

#[test]
fn corrupt_signature_is_caught() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let path = dir.path().join("a.oas").to_str().unwrap().to_string();
    {
        let mut creator = OasisCreator::create(&path,FileType::Auto,ValScheme::Crc32).expect("create failed");
        emit_layout(&mut creator).expect("emit failed");
    }
    let mut bytes = std::fs::read(&path).expect("read failed");
    // flip a bit in the middle of the cell data
    let middle = bytes.len()/2;
    bytes[middle] ^= 1;
    std::fs::write(&path,&bytes).expect("write failed");
    let err = validate_file(&path).err().expect("should fail");
    assert!(err.to_string().contains("validation failed"),"{}",err);
}

#[test]
fn cell_filter() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let path = dir.path().join("a.oas").to_str().unwrap().to_string();
    {
        let mut creator = OasisCreator::create(&path,FileType::Auto,ValScheme::None).expect("create failed");
        emit_layout(&mut creator).expect("emit failed");
    }
    struct CellRecorder {
        cells: Vec<String>,
        rects: usize
    }
    impl OasisBuilder for CellRecorder {
        fn begin_cell(&mut self,cell: &std::rc::Rc<OasisName>) -> STDRESULT {
            self.cells.push(cell.name_str());
            Ok(())
        }
        fn begin_rectangle(&mut self,_l: u64,_d: u64,_x: i64,_y: i64,_w: i64,_h: i64,
            _rep: Option<&Repetition>) -> STDRESULT {
            self.rects += 1;
            Ok(())
        }
    }
    let mut parser = OasisParser::open(&path,None,&OasisParserOptions::default()).expect("open failed");
    let mut recorder = CellRecorder { cells: Vec::new(), rects: 0 };
    let found = parser.parse_cell("SUB",&mut recorder).expect("parse failed");
    assert!(found);
    assert_eq!(recorder.cells,vec!["SUB".to_string()]);
    assert_eq!(recorder.rects,1);
    assert!(!parser.parse_cell("NOWHERE",&mut recorder).expect("parse failed"));
}
