// Pipeline tests: GDSII in, OASIS out, and back again.
use lytkit::conv::{convert_gds_to_oasis,convert_oasis_to_gds,GdsToOasisOptions};
use lytkit::fio::FileType;
use lytkit::gdsii::builder::*;
use lytkit::gdsii::{GdsBuilder,GdsCreator,GdsParser,GdsPoint};
use lytkit::oasis::names::OasisName;
use lytkit::oasis::rep::{Delta,Repetition};
use lytkit::oasis::{OasisBuilder,OasisParser,OasisParserOptions};

type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn date() -> GdsDate {
    GdsDate { year: 2004, month: 3, day: 2, hour: 11, minute: 0, second: 0 }
}

fn square_at(x: i32,y: i32) -> Vec<GdsPoint> {
    vec![GdsPoint::new(x,y),GdsPoint::new(x+100,y),GdsPoint::new(x+100,y+100),
        GdsPoint::new(x,y+100),GdsPoint::new(x,y)]
}

/// TOP holds the same square at an 8x5 grid plus one stray, plus an AREF
/// of SUB; SUB holds one square.
fn write_gds(path: &str) -> Vec<(i32,i32)> {
    let mut positions = Vec::new();
    let mut creator = GdsCreator::create(path,FileType::Auto).expect("create failed");
    creator.gds_version(600).unwrap();
    creator.begin_library("CONVLIB",&date(),&date(),
        &GdsUnits { db_to_user: 0.001, db_to_meter: 1e-9 },
        &GdsLibraryOptions::default()).unwrap();
    creator.begin_structure("TOP",&date(),&date(),&GdsStructureOptions::default()).unwrap();
    for r in 0..5 {
        for c in 0..8 {
            let (x,y) = (c*1000,r*2000);
            positions.push((x,y));
            creator.begin_boundary(1,0,&square_at(x,y),&GdsElementOptions::default()).unwrap();
            creator.end_element().unwrap();
        }
    }
    positions.push((50000,60000));
    creator.begin_boundary(1,0,&square_at(50000,60000),&GdsElementOptions::default()).unwrap();
    creator.end_element().unwrap();
    creator.begin_aref("SUB",4,3,
        &[GdsPoint::new(0,100000),GdsPoint::new(4000,100000),GdsPoint::new(0,103000)],
        &None,&GdsElementOptions::default()).unwrap();
    creator.end_element().unwrap();
    creator.end_structure().unwrap();
    creator.begin_structure("SUB",&date(),&date(),&GdsStructureOptions::default()).unwrap();
    creator.begin_boundary(2,0,&square_at(0,0),&GdsElementOptions::default()).unwrap();
    creator.end_element().unwrap();
    creator.end_structure().unwrap();
    creator.end_library().unwrap();
    positions
}

#[derive(Default)]
struct OasisRecorder {
    polygons: Vec<(i64,i64,Option<Repetition>)>,
    placements: Vec<(String,i64,i64,Option<Repetition>)>
}

impl OasisBuilder for OasisRecorder {
    fn begin_polygon(&mut self,_l: u64,_d: u64,x: i64,y: i64,_points: &[Delta],
        rep: Option<&Repetition>) -> STDRESULT {
        self.polygons.push((x,y,rep.cloned()));
        Ok(())
    }
    fn begin_placement(&mut self,cell: &std::rc::Rc<OasisName>,x: i64,y: i64,
        _mag: &lytkit::oasis::oreal::Oreal,_angle: &lytkit::oasis::oreal::Oreal,
        _flip: bool,rep: Option<&Repetition>) -> STDRESULT {
        self.placements.push((cell.name_str(),x,y,rep.cloned()));
        Ok(())
    }
}

#[test]
fn grid_becomes_matrix_repetition() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    let oas = dir.path().join("a.oas").to_str().unwrap().to_string();
    write_gds(&gds);
    convert_gds_to_oasis(&gds,&oas,&GdsToOasisOptions::default()).expect("conversion failed");

    let mut parser = OasisParser::open(&oas,None,&OasisParserOptions::default()).expect("open failed");
    let mut recorder = OasisRecorder::default();
    parser.parse_file(&mut recorder).expect("parse failed");

    // the 40 identical squares come out as one polygon with a matrix
    // repetition, the stray as a bare polygon; SUB has one more polygon
    assert_eq!(recorder.polygons.len(),3);
    let with_rep: Vec<&(i64,i64,Option<Repetition>)> =
        recorder.polygons.iter().filter(|p| p.2.is_some()).collect();
    assert_eq!(with_rep.len(),1);
    assert_eq!(with_rep[0].0,0);
    assert_eq!(with_rep[0].1,0);
    assert_eq!(with_rep[0].2,Some(Repetition::Matrix {
        cols: 8, rows: 5, col_space: 1000, row_space: 2000 }));
    assert!(recorder.polygons.iter().any(|p| (p.0,p.1)==(50000,60000) && p.2.is_none()));

    // the AREF comes through as one matrix placement
    assert_eq!(recorder.placements.len(),1);
    let (sname,x,y,rep) = &recorder.placements[0];
    assert_eq!(sname,"SUB");
    assert_eq!((*x,*y),(0,100000));
    assert_eq!(*rep,Some(Repetition::Matrix { cols: 4, rows: 3, col_space: 1000, row_space: 1000 }));
}

#[derive(Default)]
struct GdsRecorder {
    boundaries: Vec<(i16,(i32,i32))>,
    arefs: Vec<(String,i16,i16)>
}

impl GdsBuilder for GdsRecorder {
    fn begin_boundary(&mut self,layer: i16,_d: i16,points: &[GdsPoint],
        _o: &GdsElementOptions) -> STDRESULT {
        self.boundaries.push((layer,(points[0].x,points[0].y)));
        Ok(())
    }
    fn begin_aref(&mut self,sname: &str,cols: i16,rows: i16,_p: &[GdsPoint;3],
        _s: &Option<GdsTransform>,_o: &GdsElementOptions) -> STDRESULT {
        self.arefs.push((sname.to_string(),cols,rows));
        Ok(())
    }
}

#[test]
fn there_and_back_again() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    let oas = dir.path().join("a.oas").to_str().unwrap().to_string();
    let back = dir.path().join("b.gds").to_str().unwrap().to_string();
    let mut top_positions = write_gds(&gds);
    convert_gds_to_oasis(&gds,&oas,&GdsToOasisOptions::default()).expect("conversion failed");
    convert_oasis_to_gds(&oas,&back).expect("conversion failed");

    let mut parser = GdsParser::open(&back,FileType::Auto,None).expect("open failed");
    let mut recorder = GdsRecorder::default();
    parser.parse_file(&mut recorder).expect("parse failed");

    // every original boundary position must reappear exactly once
    let mut layer1: Vec<(i32,i32)> = recorder.boundaries.iter()
        .filter(|b| b.0==1).map(|b| b.1).collect();
    layer1.sort();
    top_positions.sort();
    assert_eq!(layer1,top_positions);
    // SUB's own square survives on layer 2
    assert_eq!(recorder.boundaries.iter().filter(|b| b.0==2).count(),1);
    // and the array is still an AREF
    assert_eq!(recorder.arefs,vec![("SUB".to_string(),4,3)]);
}

#[test]
fn coverage_per_element_kind() {
    // a text and an sref also survive the round trip
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    let oas = dir.path().join("a.oas").to_str().unwrap().to_string();
    let back = dir.path().join("b.gds").to_str().unwrap().to_string();
    {
        let mut creator = GdsCreator::create(&gds,FileType::Auto).expect("create failed");
        creator.gds_version(600).unwrap();
        creator.begin_library("L",&date(),&date(),
            &GdsUnits { db_to_user: 0.001, db_to_meter: 1e-9 },
            &GdsLibraryOptions::default()).unwrap();
        creator.begin_structure("A",&date(),&date(),&GdsStructureOptions::default()).unwrap();
        creator.begin_text(7,1,10,20,"label",&None,&GdsTextOptions::default()).unwrap();
        creator.end_element().unwrap();
        creator.begin_sref("B",0,0,&None,&GdsElementOptions::default()).unwrap();
        creator.end_element().unwrap();
        creator.begin_node(3,1,&[GdsPoint::new(0,0),GdsPoint::new(5,5)],
            &GdsElementOptions::default()).unwrap();
        creator.end_element().unwrap();
        creator.end_structure().unwrap();
        creator.begin_structure("B",&date(),&date(),&GdsStructureOptions::default()).unwrap();
        creator.begin_box(4,2,&square_at(0,0),&GdsElementOptions::default()).unwrap();
        creator.end_element().unwrap();
        creator.end_structure().unwrap();
        creator.end_library().unwrap();
    }
    convert_gds_to_oasis(&gds,&oas,&GdsToOasisOptions::default()).expect("conversion failed");
    convert_oasis_to_gds(&oas,&back).expect("conversion failed");

    struct Everything {
        texts: Vec<(i16,i16,String)>,
        srefs: Vec<String>,
        nodes: Vec<(i16,i16,Vec<GdsPoint>)>,
        boundaries: usize
    }
    impl GdsBuilder for Everything {
        fn begin_text(&mut self,layer: i16,texttype: i16,_x: i32,_y: i32,text: &str,
            _s: &Option<GdsTransform>,_o: &GdsTextOptions) -> STDRESULT {
            self.texts.push((layer,texttype,text.to_string()));
            Ok(())
        }
        fn begin_sref(&mut self,sname: &str,_x: i32,_y: i32,_s: &Option<GdsTransform>,
            _o: &GdsElementOptions) -> STDRESULT {
            self.srefs.push(sname.to_string());
            Ok(())
        }
        fn begin_node(&mut self,layer: i16,nodetype: i16,points: &[GdsPoint],
            _o: &GdsElementOptions) -> STDRESULT {
            self.nodes.push((layer,nodetype,points.to_vec()));
            Ok(())
        }
        fn begin_boundary(&mut self,_l: i16,_d: i16,_p: &[GdsPoint],
            _o: &GdsElementOptions) -> STDRESULT {
            self.boundaries += 1;
            Ok(())
        }
    }
    let mut parser = GdsParser::open(&back,FileType::Auto,None).expect("open failed");
    let mut recorder = Everything { texts: Vec::new(), srefs: Vec::new(),
        nodes: Vec::new(), boundaries: 0 };
    parser.parse_file(&mut recorder).expect("parse failed");
    assert_eq!(recorder.texts,vec![(7,1,"label".to_string())]);
    assert_eq!(recorder.srefs,vec!["B".to_string()]);
    assert_eq!(recorder.nodes,vec![(3,1,vec![GdsPoint::new(0,0),GdsPoint::new(5,5)])]);
    // the BOX comes back as a boundary
    assert_eq!(recorder.boundaries,1);
}

#[test]
fn skewed_aref_is_fatal() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let gds = dir.path().join("a.gds").to_str().unwrap().to_string();
    let oas = dir.path().join("a.oas").to_str().unwrap().to_string();
    {
        let mut creator = GdsCreator::create(&gds,FileType::Auto).expect("create failed");
        creator.gds_version(600).unwrap();
        creator.begin_library("L",&date(),&date(),
            &GdsUnits { db_to_user: 0.001, db_to_meter: 1e-9 },
            &GdsLibraryOptions::default()).unwrap();
        creator.begin_structure("A",&date(),&date(),&GdsStructureOptions::default()).unwrap();
        // a skewed AREF must be rejected downstream
        creator.begin_aref("B",2,2,
            &[GdsPoint::new(0,0),GdsPoint::new(2000,100),GdsPoint::new(0,2000)],
            &None,&GdsElementOptions::default()).unwrap();
        creator.end_element().unwrap();
        creator.end_structure().unwrap();
        creator.end_library().unwrap();
    }
    let err = convert_gds_to_oasis(&gds,&oas,&GdsToOasisOptions::default())
        .err().expect("skewed AREF should fail");
    assert!(err.to_string().contains("not axis-aligned"),"{}",err);
}
