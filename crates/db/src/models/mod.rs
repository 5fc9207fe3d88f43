pub mod sensor_record;
